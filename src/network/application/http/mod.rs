//! HTTP/1.1 file server for embedded systems.
//!
//! This module serves a [`FileSystem`](crate::storage::FileSystem) over any
//! transport implementing [`crate::network::Accept`], using exactly two
//! caller-provided buffers and no allocation.
//!
//! # Features
//!
//! - `GET` of a file: `200 OK` with `Content-Length`, streamed through the
//!   scratch buffer
//! - `GET` of a directory: a chunked HTML listing with an upload form
//! - `POST` of `multipart/form-data`: every file part is written into the
//!   directory named by the request path, then the client is redirected
//!   to `/`
//! - One connection at a time, always closed after the response
//!
//! # Memory
//!
//! The *scratch* buffer bounds the request line, the decoded path, listing
//! entry names and upload part headers. The *streaming* buffer sets the read
//! size for upload bodies. A 512-byte scratch buffer and a 64-byte streaming
//! buffer are enough for typical browser uploads.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sdhttpd::network::application::http::Server;
//! use sdhttpd::storage::ram::RamFs;
//! # use sdhttpd::network::{Accept, Close, Connection, Read, Write};
//! # struct Radio;
//! # struct Socket;
//! # impl Read for Socket {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Socket {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for Socket {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Connection for Socket {}
//! # impl Accept for Radio {
//! #     type Connection = Socket;
//! #     type Error = ();
//! #     fn accept(&mut self) -> Result<Option<Socket>, ()> { Ok(None) }
//! # }
//!
//! let mut scratch = [0u8; 512];
//! let mut streaming = [0u8; 64];
//! let fs: RamFs<32, 4096> = RamFs::new();
//!
//! let mut server = Server::new(Radio, fs, &mut scratch, &mut streaming).unwrap();
//! loop {
//!     if let Some(outcome) = server.poll().unwrap() {
//!         // log or act on the outcome
//!         let _ = outcome;
//!     }
//! }
//! ```

/// Error type for request handling.
pub mod error;

/// Directory listing pages.
pub mod listing;

/// File download responses.
pub mod file;

/// Streaming `multipart/form-data` parser.
pub mod multipart;

/// Percent-decoding of request targets.
pub mod path;

/// Request line reading.
pub mod request;

/// Response heads and chunked bodies.
pub mod response;

mod scratch;

/// Accept loop and dispatch.
pub mod server;

/// Upload ingestion.
pub mod upload;

pub use error::Error;
pub use multipart::{MultipartParser, PartHandler};
pub use response::Status;
pub use server::{Options, Outcome, Server};
pub use upload::UploadReport;
