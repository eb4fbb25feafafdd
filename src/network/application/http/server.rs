//! The accept loop and request dispatch.
//!
//! [`Server`] owns an [`Accept`] source, a [`FileSystem`] and the two
//! caller-provided buffers. Each accepted connection is served to completion
//! and closed before the next one is taken:
//!
//! ```text
//! accept ─▶ request line ─▶ decode target ─┬─ GET  ─▶ file body | listing
//!                                           └─ POST ─▶ multipart ─▶ 303
//! ```
//!
//! The scratch buffer is reused for every phase of a request: it first holds
//! the request line, then the decoded path, then listing entry names or the
//! upload's destination prefix and part headers. The streaming buffer is only
//! used for upload body chunks.

use super::error::Error;
use super::file;
use super::listing;
use super::path::decode_in_place;
use super::request::{Method, RequestLine, read_request_line, skip_headers};
use super::response::{Head, Status};
use super::upload::{self, UploadReport, destination_prefix};
use crate::network::error::Error as NetworkError;
use crate::network::{Accept, Connection, Read, Write};
use crate::storage::{FileSystem, Mode};

/// Server behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Answer methods other than `GET` and `POST` with
    /// `405 Method Not Allowed`. When off they are handled as uploads.
    pub reject_unknown_methods: bool,
    /// Stop reading an upload body after this many bytes.
    pub max_upload_bytes: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reject_unknown_methods: true,
            max_upload_bytes: None,
        }
    }
}

/// How a connection was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Closed without a response: the client sent no request line or the
    /// transport failed.
    Closed,
    /// A response with this status was sent.
    Responded(Status),
    /// An upload was processed and the client redirected to `/`.
    Uploaded(UploadReport),
}

/// A single-connection HTTP file server.
///
/// # Examples
///
/// ```rust
/// use sdhttpd::network::application::http::{Options, Server};
/// use sdhttpd::storage::ram::RamFs;
/// # use sdhttpd::network::{Accept, Close, Connection, Read, Write};
/// # struct Idle;
/// # struct Never;
/// # impl Read for Never {
/// #     type Error = ();
/// #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
/// # }
/// # impl Write for Never {
/// #     type Error = ();
/// #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
/// #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl Close for Never {
/// #     type Error = ();
/// #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl Connection for Never {}
/// # impl Accept for Idle {
/// #     type Connection = Never;
/// #     type Error = ();
/// #     fn accept(&mut self) -> Result<Option<Never>, ()> { Ok(None) }
/// # }
///
/// let mut scratch = [0u8; 512];
/// let mut streaming = [0u8; 64];
/// let fs: RamFs<16, 1024> = RamFs::new();
///
/// let mut server = Server::new(Idle, fs, &mut scratch, &mut streaming)
///     .unwrap()
///     .with_options(Options {
///         max_upload_bytes: Some(64 * 1024),
///         ..Options::default()
///     });
///
/// // Nobody is connecting yet.
/// assert_eq!(server.poll().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct Server<'b, L, F> {
    acceptor: L,
    fs: F,
    scratch: &'b mut [u8],
    streaming: &'b mut [u8],
    options: Options,
}

impl<'b, L: Accept, F: FileSystem> Server<'b, L, F> {
    /// Wires the server to its collaborators.
    ///
    /// `scratch` bounds the request line, the decoded path, listing entry
    /// names and upload part headers. `streaming` is the upload read size and
    /// must be non-empty and no larger than `scratch`.
    pub fn new(
        acceptor: L,
        fs: F,
        scratch: &'b mut [u8],
        streaming: &'b mut [u8],
    ) -> Result<Self, Error> {
        if streaming.is_empty() || streaming.len() > scratch.len() {
            return Err(Error::InvalidConfig);
        }
        Ok(Self {
            acceptor,
            fs,
            scratch,
            streaming,
            options: Options::default(),
        })
    }

    /// Replaces the default [`Options`].
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// The options in effect.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The filesystem being served.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Mutable access to the filesystem, e.g. to seed content between polls.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Serves at most one waiting client.
    ///
    /// Returns `Ok(None)` when nobody is connecting. Only a failing acceptor
    /// is an error; problems with an individual request are reflected in the
    /// [`Outcome`].
    pub fn poll(&mut self) -> Result<Option<Outcome>, Error> {
        let connection = self.acceptor.accept().map_err(|_| Error::Accept)?;
        Ok(connection.map(|connection| self.serve(connection)))
    }

    /// Serves clients until the acceptor fails.
    pub fn run(&mut self) -> Result<(), Error> {
        loop {
            self.poll()?;
        }
    }

    /// Handles one request on `connection`, then closes it.
    pub fn serve<C: Connection>(&mut self, mut connection: C) -> Outcome {
        let outcome = match self.handle(&mut connection) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("request abandoned: {}", e);
                Outcome::Closed
            }
        };
        if connection.close().is_err() {
            debug!("connection close failed");
        }
        outcome
    }

    fn handle<C: Connection>(&mut self, conn: &mut C) -> Result<Outcome, Error> {
        let Some(line_len) = read_request_line(conn, self.scratch)? else {
            debug!("client left before sending a request");
            return Ok(Outcome::Closed);
        };

        let request = RequestLine::parse(&self.scratch[..line_len]);
        let method = match request.method {
            Method::Other if self.options.reject_unknown_methods => {
                drain_headers(conn);
                return respond_empty(conn, Status::MethodNotAllowed);
            }
            Method::Other => Method::Post,
            method => method,
        };
        // Uploads read their own headers; everything else is answered only
        // once the client has finished sending.
        if method == Method::Get {
            drain_headers(conn);
        }

        let target_len = request.target.len();
        self.scratch.copy_within(request.target, 0);
        let path_len = decode_in_place(&mut self.scratch[..target_len]);
        let Ok(path) = core::str::from_utf8(&self.scratch[..path_len]) else {
            warn!("request target is not UTF-8");
            return respond_empty(conn, Status::BadRequest);
        };
        info!("{} {}", method.as_str(), path);

        match method {
            Method::Get => self.get(conn, path_len),
            _ => self.post(conn, path_len),
        }
    }

    /// `scratch[..path_len]` holds the decoded, UTF-8 checked path.
    fn get<C: Connection>(&mut self, conn: &mut C, path_len: usize) -> Result<Outcome, Error> {
        let path = core::str::from_utf8(&self.scratch[..path_len]).unwrap_or("");
        let mut handle = match self.fs.open(path, Mode::Read) {
            Ok(handle) => handle,
            Err(_) => {
                debug!("{} not found", path);
                return respond_empty(conn, Status::NotFound);
            }
        };

        let sent = if self.fs.is_dir(&handle) {
            let (dir_path, name_buf) = self.scratch.split_at_mut(path_len);
            listing::render(conn, &mut self.fs, &mut handle, dir_path, name_buf).map(|_| ())
        } else {
            file::respond(conn, &mut self.fs, &mut handle, &mut self.scratch[..]).map(|_| ())
        };
        if self.fs.close(handle).is_err() {
            warn!("closing served handle failed");
        }
        sent?;

        Ok(Outcome::Responded(Status::Ok))
    }

    fn post<C: Connection>(&mut self, conn: &mut C, path_len: usize) -> Result<Outcome, Error> {
        let Some(prefix_len) = destination_prefix(self.scratch, path_len) else {
            warn!("upload directory path too long");
            return respond_empty(conn, Status::BadRequest);
        };

        let result = upload::ingest(
            conn,
            &mut self.fs,
            &mut self.scratch[..],
            prefix_len,
            &mut self.streaming[..],
            &self.options,
        );
        match result {
            Ok(report) => {
                Head::redirect("/").write_to(conn)?;
                conn.flush().map_err(|_| NetworkError::WriteError)?;
                Ok(Outcome::Uploaded(report))
            }
            Err(e @ (Error::MissingBoundary | Error::InvalidBoundary)) => {
                warn!("upload rejected: {}", e);
                respond_empty(conn, Status::BadRequest)
            }
            Err(e) => Err(e),
        }
    }
}

/// Reads the rest of the request head so closing the connection does not
/// discard bytes the client is still sending.
fn drain_headers<R: Read + ?Sized>(reader: &mut R) {
    match skip_headers(reader) {
        Ok(true) => {}
        Ok(false) => debug!("request ended inside its headers"),
        Err(e) => debug!("reading request headers failed: {}", e),
    }
}

fn respond_empty<W: Write + ?Sized>(writer: &mut W, status: Status) -> Result<Outcome, Error> {
    Head::empty(status).write_to(writer)?;
    writer.flush().map_err(|_| NetworkError::WriteError)?;
    Ok(Outcome::Responded(status))
}
