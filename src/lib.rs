//! # sdhttpd - two-buffer HTTP file server
//!
//! A small HTTP/1.1 server for devices that keep their files on an SD card
//! (or any other hierarchical store) and have only a few hundred bytes of RAM
//! to spare for networking. It serves files, renders directory listings with
//! an upload form, and accepts `multipart/form-data` uploads, all through two
//! caller-provided buffers and without a heap. The crate is `no_std`.
//!
//! ## Features
//!
//! ### Serving
//! - **File download**: `GET` streams a file with `Content-Length`
//! - **Directory listing**: `GET` of a directory returns a chunked HTML page
//!   linking every entry
//! - **Upload**: `POST` parses multipart bodies of any size with a streaming
//!   parser and stores every file part in the requested directory
//!
//! ### Portability
//! - Transport-agnostic: anything implementing [`network::Accept`] works,
//!   from an AT-command WiFi module to `std::net`
//! - Storage-agnostic: anything implementing [`storage::FileSystem`] works;
//!   an in-memory [`storage::ram::RamFs`] is included
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sdhttpd = "0.1.0"
//! ```
//!
//! ### Serving an in-memory volume
//!
//! ```rust
//! use sdhttpd::network::application::http::{Outcome, Server, Status};
//! use sdhttpd::storage::ram::RamFs;
//! # use sdhttpd::network::{Accept, Close, Connection, Read, Write};
//! # struct Once(Option<Client>);
//! # struct Client { request: &'static [u8] }
//! # impl Read for Client {
//! #     type Error = ();
//! #     fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
//! #         let n = buf.len().min(self.request.len());
//! #         buf[..n].copy_from_slice(&self.request[..n]);
//! #         self.request = &self.request[n..];
//! #         Ok(n)
//! #     }
//! # }
//! # impl Write for Client {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for Client {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Connection for Client {}
//! # impl Accept for Once {
//! #     type Connection = Client;
//! #     type Error = ();
//! #     fn accept(&mut self) -> Result<Option<Client>, ()> { Ok(self.0.take()) }
//! # }
//! # let acceptor = Once(Some(Client { request: b"GET /hello.txt HTTP/1.1\r\n\r\n" }));
//!
//! let mut fs: RamFs<8, 512> = RamFs::new();
//! fs.write_file("hello.txt", b"hi").unwrap();
//!
//! let mut scratch = [0u8; 512];
//! let mut streaming = [0u8; 64];
//! let mut server = Server::new(acceptor, fs, &mut scratch, &mut streaming).unwrap();
//!
//! let outcome = server.poll().unwrap();
//! assert_eq!(outcome, Some(Outcome::Responded(Status::Ok)));
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through `defmt` with the `defmt` feature, or through the
//! `log` facade with the `log` feature. Without either they compile away.
//!
//! ## Optional Features
//!
//! - `std`: `std::net` transport and host-directory filesystem adapters
//! - `defmt`: `defmt` logging and `defmt::Format` for error types
//! - `log`: logging through the `log` facade

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Transport abstraction and the HTTP server built on it.
///
/// Holds the connection traits, stream helpers and, under
/// [`network::application::http`], the server itself.
pub mod network;

/// Hierarchical filesystem abstraction.
///
/// The server reaches storage only through [`storage::FileSystem`].
pub mod storage;
