//! Host transport over `std::net`.

use super::error::Error;
use super::{Accept, Close, Connection, Read, Write};
use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::time::Duration;

fn map_read_error(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::Timeout,
        ErrorKind::NotConnected => Error::NotOpen,
        _ => Error::ReadError,
    }
}

/// An accepted TCP connection.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    /// Wraps a connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl Read for TcpConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).map_err(map_read_error)
    }
}

impl Write for TcpConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

/// Upper bound on bytes discarded when closing.
const CLOSE_DRAIN_LIMIT: usize = 16 * 1024;

impl TcpConnection {
    /// Discards request bytes that already arrived but were never read, such
    /// as the line break after an upload's closing delimiter. Closing a socket
    /// with unread input makes the kernel reset the connection, which can
    /// destroy the response before the client reads it.
    fn discard_pending(&mut self) {
        if self.stream.set_nonblocking(true).is_err() {
            return;
        }
        let mut sink = [0u8; 256];
        let mut discarded = 0;
        while discarded < CLOSE_DRAIN_LIMIT {
            match self.stream.read(&mut sink) {
                Ok(0) | Err(_) => break,
                Ok(n) => discarded += n,
            }
        }
    }
}

impl Close for TcpConnection {
    type Error = Error;
    fn close(mut self) -> Result<(), Self::Error> {
        self.discard_pending();
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(_) => Err(Error::NotOpen),
        }
    }
}

impl Connection for TcpConnection {}

/// Blocking acceptor over a bound [`TcpListener`].
///
/// `read_timeout` is applied to every accepted stream. It is the only guard
/// against a client that stops sending mid-request: a timed-out read ends
/// the request phase it interrupted.
#[derive(Debug)]
pub struct TcpAcceptor {
    listener: TcpListener,
    read_timeout: Option<Duration>,
}

impl TcpAcceptor {
    /// Accepts from `listener`, which is expected to be in blocking mode.
    pub fn new(listener: TcpListener, read_timeout: Option<Duration>) -> Self {
        Self {
            listener,
            read_timeout,
        }
    }
}

impl Accept for TcpAcceptor {
    type Connection = TcpConnection;
    type Error = std::io::Error;

    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error> {
        let (stream, _peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e),
        };
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(self.read_timeout)?;
        Ok(Some(TcpConnection::new(stream)))
    }
}
