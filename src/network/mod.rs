//! Byte-stream abstraction for the server side of a connection.
//!
//! The server never talks to a network stack directly. Anything that can
//! hand out blocking connections (a WiFi module, smoltcp, `std::net`) plugs in
//! through the traits here:
//!
//! - [`Read`], [`Write`] and [`Close`] describe one accepted connection.
//!   A read that returns `Ok(0)` means the peer has finished sending or gone
//!   away; a read that blocks is the "no bytes available yet" state.
//! - [`Accept`] is the outer readiness check: it yields the next waiting
//!   client, or `None` when nobody is connecting.
//!
//! Byte-at-a-time and delimiter-bounded reads are provided on top of these by
//! the [`stream`] helpers, so transports only implement the bulk operations.

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// Blocking helpers built on [`Read`] and [`Write`].
pub mod stream;

/// Application layer protocols.
pub mod application;

/// `std::net` adapters.
#[cfg(feature = "std")]
pub mod tcp;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Accept, Close, Connection, Read, Write};
}

/// Blocking reads from a connection.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection, blocking until at least one byte arrives.
    ///
    /// Returns `Ok(0)` once the peer will send nothing more.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Blocking writes to a connection.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Ends a connection.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A listening endpoint (server side).
pub trait Accept {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Take the next pending connection, or `None` if no client is waiting.
    fn accept(&mut self) -> Result<Option<Self::Connection>, Self::Error>;
}
