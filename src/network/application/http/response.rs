//! Response heads and chunked bodies.

use crate::network::Write;
use crate::network::error::Error;
use crate::network::stream::write_all;
use core::fmt::Write as _;
use heapless::String;

const HEAD_CAPACITY: usize = 256;

/// Status codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// 200
    Ok = 200,
    /// 303, sent after every upload
    SeeOther = 303,
    /// 400
    BadRequest = 400,
    /// 404
    NotFound = 404,
    /// 405
    MethodNotAllowed = 405,
}

impl Status {
    /// Numeric status code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::SeeOther => "See Other",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

/// How the body following a head is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// Exactly this many bytes follow.
    Length(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
}

/// Status line and headers. Every response closes the connection.
#[derive(Debug, Clone, Copy)]
pub struct Head<'a> {
    /// Status line.
    pub status: Status,
    /// `Content-Type` value.
    pub content_type: &'a str,
    /// Body framing.
    pub body: Body,
    /// `Location` value, if any.
    pub location: Option<&'a str>,
}

impl<'a> Head<'a> {
    /// A head for a response with no body.
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            content_type: "text/html",
            body: Body::Length(0),
            location: None,
        }
    }

    /// `303 See Other` pointing at `location`.
    pub fn redirect(location: &'a str) -> Self {
        Self {
            location: Some(location),
            ..Self::empty(Status::SeeOther)
        }
    }

    /// Writes the status line and headers, including the blank line.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), Error> {
        let mut head: String<HEAD_CAPACITY> = String::new();
        self.format(&mut head).map_err(|_| Error::WriteError)?;
        write_all(writer, head.as_bytes())
    }

    fn format(&self, out: &mut String<HEAD_CAPACITY>) -> core::fmt::Result {
        write!(
            out,
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason_phrase()
        )?;
        if let Some(location) = self.location {
            write!(out, "Location: {}\r\n", location)?;
        }
        write!(out, "Content-Type: {}\r\n", self.content_type)?;
        match self.body {
            Body::Length(len) => write!(out, "Content-Length: {}\r\n", len)?,
            Body::Chunked => out.write_str("Transfer-Encoding: chunked\r\n")?,
        }
        out.write_str("Connection: close\r\n\r\n")
    }
}

/// Writes `Transfer-Encoding: chunked` framing.
///
/// Each call to [`chunk`](Self::chunk) emits one chunk whose size line is the
/// combined length of the given parts.
#[derive(Debug)]
pub struct ChunkedWriter<'w, W: Write + ?Sized> {
    writer: &'w mut W,
}

impl<'w, W: Write + ?Sized> ChunkedWriter<'w, W> {
    /// Frames everything later written through `writer`.
    pub fn new(writer: &'w mut W) -> Self {
        Self { writer }
    }

    /// Writes `parts` as one chunk. Empty input writes nothing, since an
    /// empty chunk would end the body.
    pub fn chunk(&mut self, parts: &[&[u8]]) -> Result<(), Error> {
        let len: usize = parts.iter().map(|part| part.len()).sum();
        if len == 0 {
            return Ok(());
        }
        let mut size: String<20> = String::new();
        write!(size, "{:x}\r\n", len).map_err(|_| Error::WriteError)?;
        write_all(self.writer, size.as_bytes())?;
        for part in parts {
            write_all(self.writer, part)?;
        }
        write_all(self.writer, b"\r\n")
    }

    /// Writes the zero-length terminating chunk.
    pub fn finish(self) -> Result<(), Error> {
        write_all(self.writer, b"0\r\n\r\n")?;
        self.writer.flush().map_err(|_| Error::WriteError)
    }
}
