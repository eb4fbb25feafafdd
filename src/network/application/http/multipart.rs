//! Streaming `multipart/form-data` parser.
//!
//! [`MultipartParser`] is a byte-driven state machine over the RFC 1341
//! framing used by HTML upload forms:
//!
//! ```text
//! --BOUNDARY\r\n
//! Content-Disposition: form-data; name="file"; filename="a.txt"\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! ...part data...\r\n
//! --BOUNDARY--\r\n
//! ```
//!
//! It holds no buffer beyond the delimiter and a lookbehind of the same size,
//! so memory use does not depend on part size. Events are delivered to a
//! [`PartHandler`] while [`feed`](MultipartParser::feed) runs. Header and data
//! slices point into the chunk being fed and are only valid for the duration
//! of the callback.
//!
//! Inside part data every `\r\n` might start the closing delimiter. Those
//! bytes are held in the lookbehind until the delimiter either completes
//! (the part ends) or diverges, in which case the held bytes are handed to
//! [`PartHandler::on_part_data`] before parsing continues at the byte that
//! broke the match. The output is therefore the same whichever way the body
//! is split into chunks.

use super::error::Error;
use core::ops::ControlFlow;
use heapless::Vec;

/// Longest boundary accepted, per RFC 2046.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// `--` followed by the boundary.
const MAX_DELIMITER_LEN: usize = MAX_BOUNDARY_LEN + 2;

/// `\r\n` followed by the delimiter.
const LOOKBEHIND_LEN: usize = MAX_DELIMITER_LEN + 2;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Parser position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum State {
    Start,
    StartBoundary,
    HeaderFieldStart,
    HeaderField,
    HeadersAlmostDone,
    HeaderValueStart,
    HeaderValue,
    HeaderValueAlmostDone,
    PartData,
    PartDataAlmostBoundary,
    PartDataBoundary,
    PartDataAlmostEnd,
    PartDataEnd,
    PartDataFinalHyphen,
    /// The closing delimiter was seen; further input is ignored.
    End,
}

/// Receives parser events. Every method defaults to doing nothing.
///
/// Returning [`ControlFlow::Break`] stops the current
/// [`feed`](MultipartParser::feed), which then reports fewer bytes consumed
/// than it was given.
pub trait PartHandler {
    /// A delimiter line opened a new part.
    fn on_part_begin(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Header name bytes. May arrive in several pieces.
    fn on_header_field(&mut self, _name: &[u8]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Header value bytes. May arrive in several pieces.
    fn on_header_value(&mut self, _value: &[u8]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// The blank line ending the part's headers.
    fn on_headers_complete(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Part body bytes. Never empty.
    fn on_part_data(&mut self, _data: &[u8]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// The delimiter closing the current part.
    fn on_part_data_end(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// The final `--` after the last delimiter.
    fn on_body_end(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

macro_rules! emit {
    ($call:expr, $at:expr) => {
        if $call.is_break() {
            return $at;
        }
    };
}

fn data<H: PartHandler + ?Sized>(handler: &mut H, bytes: &[u8]) -> ControlFlow<()> {
    if bytes.is_empty() {
        ControlFlow::Continue(())
    } else {
        handler.on_part_data(bytes)
    }
}

fn header_value<H: PartHandler + ?Sized>(handler: &mut H, bytes: &[u8]) -> ControlFlow<()> {
    if bytes.is_empty() {
        ControlFlow::Continue(())
    } else {
        handler.on_header_value(bytes)
    }
}

/// Incremental multipart parser for one request body.
#[derive(Debug, Clone)]
pub struct MultipartParser {
    state: State,
    delimiter: Vec<u8, MAX_DELIMITER_LEN>,
    lookbehind: [u8; LOOKBEHIND_LEN],
    index: usize,
}

impl MultipartParser {
    /// Creates a parser for `boundary`, as given in the `Content-Type`
    /// header (without the leading `--`).
    pub fn new(boundary: &[u8]) -> Result<Self, Error> {
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
            return Err(Error::InvalidBoundary);
        }
        let mut delimiter = Vec::new();
        delimiter
            .extend_from_slice(b"--")
            .map_err(|_| Error::InvalidBoundary)?;
        delimiter
            .extend_from_slice(boundary)
            .map_err(|_| Error::InvalidBoundary)?;

        Ok(Self {
            state: State::Start,
            delimiter,
            lookbehind: [0; LOOKBEHIND_LEN],
            index: 0,
        })
    }

    /// Current position.
    pub fn state(&self) -> State {
        self.state
    }

    /// `true` once the closing `--BOUNDARY--` has been read.
    pub fn is_finished(&self) -> bool {
        self.state == State::End
    }

    /// Parses `chunk`, returning how many bytes were consumed.
    ///
    /// A return value smaller than `chunk.len()` means the input does not
    /// follow the framing (or the handler asked to stop); the parser reports
    /// this only through the count and the caller should abandon the body.
    /// Bytes after the closing delimiter are consumed and ignored.
    pub fn feed<H: PartHandler + ?Sized>(&mut self, chunk: &[u8], handler: &mut H) -> usize {
        let len = chunk.len();
        let mut i = 0;
        let mut mark = 0;

        // Arms that `continue` re-examine the same byte in the new state.
        while i < len {
            let c = chunk[i];
            let is_last = i + 1 == len;

            match self.state {
                State::Start => {
                    self.index = 0;
                    self.state = State::StartBoundary;
                    continue;
                }

                State::StartBoundary => {
                    let delimiter_len = self.delimiter.len();
                    if self.index == delimiter_len {
                        if c != CR {
                            return i;
                        }
                        self.index += 1;
                    } else if self.index == delimiter_len + 1 {
                        if c != LF {
                            return i;
                        }
                        self.index = 0;
                        emit!(handler.on_part_begin(), i);
                        self.state = State::HeaderFieldStart;
                    } else {
                        if c != self.delimiter[self.index] {
                            return i;
                        }
                        self.index += 1;
                    }
                }

                State::HeaderFieldStart => {
                    mark = i;
                    self.state = State::HeaderField;
                    continue;
                }

                State::HeaderField => {
                    if c == CR {
                        self.state = State::HeadersAlmostDone;
                    } else if c == b':' {
                        if i > mark {
                            emit!(handler.on_header_field(&chunk[mark..i]), i);
                        }
                        self.state = State::HeaderValueStart;
                    } else if c != b'-' && !c.is_ascii_alphabetic() {
                        return i;
                    } else if is_last {
                        emit!(handler.on_header_field(&chunk[mark..=i]), i);
                    }
                }

                State::HeadersAlmostDone => {
                    if c != LF {
                        return i;
                    }
                    emit!(handler.on_headers_complete(), i);
                    mark = i + 1;
                    self.state = State::PartData;
                }

                State::HeaderValueStart => {
                    if c != b' ' {
                        mark = i;
                        self.state = State::HeaderValue;
                        continue;
                    }
                }

                State::HeaderValue => {
                    if c == CR {
                        emit!(header_value(handler, &chunk[mark..i]), i);
                        self.state = State::HeaderValueAlmostDone;
                    } else if is_last {
                        emit!(header_value(handler, &chunk[mark..=i]), i);
                    }
                }

                State::HeaderValueAlmostDone => {
                    if c != LF {
                        return i;
                    }
                    self.state = State::HeaderFieldStart;
                }

                State::PartData => {
                    if c == CR {
                        emit!(data(handler, &chunk[mark..i]), i);
                        self.lookbehind[0] = CR;
                        self.state = State::PartDataAlmostBoundary;
                    } else if is_last {
                        emit!(data(handler, &chunk[mark..=i]), i);
                    }
                }

                State::PartDataAlmostBoundary => {
                    if c == LF {
                        self.lookbehind[1] = LF;
                        self.index = 0;
                        self.state = State::PartDataBoundary;
                    } else {
                        // A lone CR is data.
                        emit!(data(handler, &self.lookbehind[..1]), i);
                        mark = i;
                        self.state = State::PartData;
                        continue;
                    }
                }

                State::PartDataBoundary => {
                    if self.delimiter[self.index] != c {
                        emit!(data(handler, &self.lookbehind[..2 + self.index]), i);
                        mark = i;
                        self.state = State::PartData;
                        continue;
                    }
                    self.lookbehind[2 + self.index] = c;
                    self.index += 1;
                    if self.index == self.delimiter.len() {
                        emit!(handler.on_part_data_end(), i);
                        self.state = State::PartDataAlmostEnd;
                    }
                }

                State::PartDataAlmostEnd => match c {
                    b'-' => self.state = State::PartDataFinalHyphen,
                    CR => self.state = State::PartDataEnd,
                    _ => return i,
                },

                State::PartDataFinalHyphen => {
                    if c != b'-' {
                        return i;
                    }
                    emit!(handler.on_body_end(), i);
                    self.state = State::End;
                }

                State::PartDataEnd => {
                    if c != LF {
                        return i;
                    }
                    emit!(handler.on_part_begin(), i);
                    self.state = State::HeaderFieldStart;
                }

                State::End => {}
            }

            i += 1;
        }

        len
    }
}
