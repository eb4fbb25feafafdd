//! Scripted connections and response parsing shared by the integration tests.

#![allow(dead_code)]

use sdhttpd::network::error::Error;
use sdhttpd::network::{Accept, Close, Connection, Read, Write};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// What a [`MockConnection`] saw after the server dropped it.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    written: Rc<RefCell<Vec<u8>>>,
    closed: Rc<Cell<bool>>,
    unread: Rc<Cell<usize>>,
}

impl Transcript {
    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Request bytes still pending when the connection was closed.
    pub fn unread(&self) -> usize {
        self.unread.get()
    }

    pub fn response(&self) -> Response {
        Response::parse(&self.written())
    }
}

/// A connection replaying a fixed request, handing out at most `max_read`
/// bytes per read.
#[derive(Debug)]
pub struct MockConnection {
    input: Vec<u8>,
    position: usize,
    max_read: usize,
    fail_at: Option<usize>,
    transcript: Transcript,
}

impl MockConnection {
    pub fn new(input: &[u8], max_read: usize) -> (Self, Transcript) {
        let transcript = Transcript::default();
        let connection = Self {
            input: input.to_vec(),
            position: 0,
            max_read: max_read.max(1),
            fail_at: None,
            transcript: transcript.clone(),
        };
        (connection, transcript)
    }

    /// Reads fail once `offset` bytes have been handed out.
    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at = Some(offset);
        self
    }
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_at.is_some_and(|at| self.position >= at) {
            return Err(Error::ConnectionClosed);
        }
        let mut end = (self.position + buf.len().min(self.max_read)).min(self.input.len());
        if let Some(at) = self.fail_at {
            end = end.min(at.max(self.position));
        }
        let n = end - self.position;
        buf[..n].copy_from_slice(&self.input[self.position..end]);
        self.position = end;
        Ok(n)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.transcript.is_closed() {
            return Err(Error::NotOpen);
        }
        self.transcript.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.transcript.closed.set(true);
        self.transcript.unread.set(self.input.len() - self.position);
        Ok(())
    }
}

impl Connection for MockConnection {}

/// Hands out queued connections, then reports nobody waiting.
#[derive(Debug, Default)]
pub struct MockAcceptor {
    pub pending: VecDeque<MockConnection>,
    pub fail: bool,
}

impl Accept for MockAcceptor {
    type Connection = MockConnection;
    type Error = Error;

    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error> {
        if self.fail {
            return Err(Error::NotOpen);
        }
        Ok(self.pending.pop_front())
    }
}

/// A parsed response, with the body de-chunked and its framing checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Sizes of the data chunks, excluding the terminator.
    pub chunks: Vec<usize>,
}

impl Response {
    pub fn parse(raw: &[u8]) -> Self {
        let head_end = find(raw, b"\r\n\r\n").expect("response head is terminated");
        let head = std::str::from_utf8(&raw[..head_end]).expect("head is ASCII");
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap();
        assert!(status_line.starts_with("HTTP/1.1 "), "{}", status_line);
        let status = status_line[9..12].parse().unwrap();

        let headers: Vec<(String, String)> = lines
            .map(|line| {
                let (name, value) = line.split_once(": ").expect("header has a colon");
                (name.to_string(), value.to_string())
            })
            .collect();

        let mut response = Response {
            status,
            headers,
            body: Vec::new(),
            chunks: Vec::new(),
        };
        let rest = &raw[head_end + 4..];

        if response.header("Transfer-Encoding") == Some("chunked") {
            let mut at = 0;
            loop {
                let line_end = at + find(&rest[at..], b"\r\n").expect("chunk size line");
                let size_text = std::str::from_utf8(&rest[at..line_end]).unwrap();
                let size = usize::from_str_radix(size_text, 16).expect("hex chunk size");
                at = line_end + 2;
                if size == 0 {
                    assert_eq!(&rest[at..], b"\r\n", "terminator ends the body");
                    break;
                }
                response.body.extend_from_slice(&rest[at..at + size]);
                response.chunks.push(size);
                at += size;
                assert_eq!(&rest[at..at + 2], b"\r\n", "chunk data is CRLF terminated");
                at += 2;
            }
        } else {
            let length: usize = response
                .header("Content-Length")
                .expect("Content-Length present")
                .parse()
                .unwrap();
            assert_eq!(rest.len(), length, "Content-Length matches the body");
            response.body = rest.to_vec();
        }

        response
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

/// One part of a multipart body.
#[derive(Debug, Clone, Copy)]
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            data,
        }
    }

    pub fn field(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            filename: None,
            data,
        }
    }
}

pub fn multipart_body(boundary: &str, parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

/// A browser-style upload request for `path`.
pub fn upload_request(path: &str, parts: &[Part<'_>]) -> Vec<u8> {
    let body = multipart_body(BOUNDARY, parts);
    let mut request = format!(
        "POST {} HTTP/1.1\r\nHost: device.local\r\nContent-Type: multipart/form-data; boundary={}\r\nContent-Length: {}\r\nOrigin: http://device.local\r\n\r\n",
        path,
        BOUNDARY,
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);
    request
}

pub fn get_request(path: &str) -> Vec<u8> {
    format!(
        "GET {} HTTP/1.1\r\nHost: device.local\r\nAccept: */*\r\n\r\n",
        path
    )
    .into_bytes()
}
