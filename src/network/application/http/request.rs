//! Request line reading and classification.

use crate::network::Read;
use crate::network::error::Error;
use crate::network::stream::read_byte;
use core::ops::Range;

/// Request method, classified by prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET `
    Get,
    /// `POST `
    Post,
    /// Anything that starts with neither `GET ` nor `POST `.
    Other,
}

impl Method {
    /// Name used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other => "OTHER",
        }
    }
}

/// A classified request line. `target` indexes into the line it was parsed
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method.
    pub method: Method,
    /// Still-encoded target.
    pub target: Range<usize>,
}

impl RequestLine {
    /// Classifies `line` (without its terminator).
    ///
    /// Everything from the first `" HTTP"` on is ignored. The target is what
    /// follows the first space, or empty if there is no space.
    pub fn parse(line: &[u8]) -> Self {
        let end = find(line, b" HTTP").unwrap_or(line.len());
        let line = &line[..end];

        let method = if line.starts_with(b"GET ") {
            Method::Get
        } else if line.starts_with(b"POST ") {
            Method::Post
        } else {
            Method::Other
        };

        let target = match line.iter().position(|&b| b == b' ') {
            Some(space) => space + 1..end,
            None => end..end,
        };

        Self { method, target }
    }
}

/// Reads one request line into `buf`, returning its length.
///
/// Bytes are read one at a time. The line ends at `\n`, or at `\r` together
/// with the byte after it; line breaks before any other byte are skipped.
/// Bytes that do not fit in `buf` are dropped, so an over-long line arrives
/// truncated rather than rejected. Returns `Ok(None)` if the stream ends
/// before a line is complete.
pub fn read_request_line<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<Option<usize>, Error> {
    let mut len = 0;
    let mut seen = false;
    loop {
        match read_byte(reader)? {
            None if seen => return Ok(Some(len)),
            None => return Ok(None),
            Some(b'\r' | b'\n') if !seen => {}
            Some(b'\n') => return Ok(Some(len)),
            Some(b'\r') => {
                // The line is complete whatever follows the CR.
                let _ = read_byte(reader);
                return Ok(Some(len));
            }
            Some(byte) => {
                seen = true;
                if len < buf.len() {
                    buf[len] = byte;
                    len += 1;
                }
            }
        }
    }
}

/// Discards header lines up to and including the blank line that ends them.
///
/// Call right after [`read_request_line`]. Lines may end in `\r\n` or a bare
/// `\n`. Returns `Ok(false)` if the stream ends first.
pub fn skip_headers<R: Read + ?Sized>(reader: &mut R) -> Result<bool, Error> {
    let mut line_len = 0usize;
    loop {
        match read_byte(reader)? {
            None => return Ok(false),
            Some(b'\r') => {}
            Some(b'\n') if line_len == 0 => return Ok(true),
            Some(b'\n') => line_len = 0,
            Some(_) => line_len += 1,
        }
    }
}

/// Finds the first occurrence of a slice in another slice and returns its starting position.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bytes<'a>(&'a [u8]);

    impl Read for Bytes<'_> {
        type Error = ();

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_parse_get() {
        let line = b"GET /docs/readme.txt HTTP/1.1";
        let parsed = RequestLine::parse(line);
        assert_eq!(parsed.method, Method::Get);
        assert_eq!(&line[parsed.target], b"/docs/readme.txt");
    }

    #[test]
    fn test_parse_post() {
        let line = b"POST /uploads HTTP/1.1";
        let parsed = RequestLine::parse(line);
        assert_eq!(parsed.method, Method::Post);
        assert_eq!(&line[parsed.target], b"/uploads");
    }

    #[test]
    fn test_parse_other_method() {
        let line = b"DELETE /x HTTP/1.1";
        let parsed = RequestLine::parse(line);
        assert_eq!(parsed.method, Method::Other);
        assert_eq!(&line[parsed.target], b"/x");
    }

    #[test]
    fn test_parse_without_version_or_target() {
        let parsed = RequestLine::parse(b"GET /plain");
        assert_eq!(parsed.target, 4..10);
        let parsed = RequestLine::parse(b"GET");
        assert_eq!(parsed.method, Method::Other);
        assert!(parsed.target.is_empty());
    }

    #[test]
    fn test_read_line_consumes_its_line_break() {
        let mut input = Bytes(b"\r\nGET / HTTP/1.1\r\nHost: x\r\n\r\n");
        let mut buf = [0u8; 64];
        let n = read_request_line(&mut input, &mut buf).unwrap().unwrap();
        assert_eq!(&buf[..n], b"GET / HTTP/1.1");
        assert_eq!(input.0, b"Host: x\r\n\r\n");
    }

    #[test]
    fn test_read_line_with_bare_newline() {
        let mut input = Bytes(b"GET /a\nHost: x\n\n");
        let mut buf = [0u8; 64];
        let n = read_request_line(&mut input, &mut buf).unwrap().unwrap();
        assert_eq!(&buf[..n], b"GET /a");
        assert_eq!(input.0, b"Host: x\n\n");
    }

    #[test]
    fn test_read_line_clamps_to_buffer() {
        let mut input = Bytes(b"GET /abcdefghijklmnop HTTP/1.1\r\nHost: x\r\n");
        let mut buf = [0u8; 8];
        let n = read_request_line(&mut input, &mut buf).unwrap().unwrap();
        assert_eq!(&buf[..n], b"GET /abc");
        assert_eq!(input.0, b"Host: x\r\n");
    }

    #[test]
    fn test_read_line_without_terminator() {
        let mut input = Bytes(b"GET /");
        let mut buf = [0u8; 8];
        assert_eq!(read_request_line(&mut input, &mut buf), Ok(None));
    }

    #[test]
    fn test_read_line_ending_at_carriage_return() {
        let mut input = Bytes(b"GET /a\r");
        let mut buf = [0u8; 8];
        assert_eq!(read_request_line(&mut input, &mut buf), Ok(Some(6)));
    }

    #[test]
    fn test_skip_headers_stops_after_blank_line() {
        let mut input = Bytes(b"Host: x\r\nAccept: */*\r\n\r\nleftover");
        assert_eq!(skip_headers(&mut input), Ok(true));
        assert_eq!(input.0, b"leftover");

        let mut input = Bytes(b"Host: x\n\nleftover");
        assert_eq!(skip_headers(&mut input), Ok(true));
        assert_eq!(input.0, b"leftover");
    }

    #[test]
    fn test_skip_headers_without_headers() {
        let mut input = Bytes(b"\r\n");
        assert_eq!(skip_headers(&mut input), Ok(true));
        assert!(input.0.is_empty());
    }

    #[test]
    fn test_skip_headers_reports_end_of_stream() {
        let mut input = Bytes(b"Host: x\r\n");
        assert_eq!(skip_headers(&mut input), Ok(false));
    }
}
