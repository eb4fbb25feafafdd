//! # Hierarchical file storage for embedded systems
//!
//! The server reads and writes files through the [`FileSystem`] trait. It is
//! shaped after FAT drivers for SD cards: paths are opened into owned
//! handles, and every operation goes back through the filesystem with that
//! handle. Handles therefore never borrow the filesystem, which lets the
//! upload path keep one file open across many parser callbacks while still
//! calling into the filesystem.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   HTTP server   │───▶│   FileSystem    │───▶│  SD card / FAT  │
//! │  (GET / POST)   │    │  (this module)  │    │  RAM / host fs  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! Paths are `/`-separated and relative to the volume root; a leading `/` is
//! insignificant. Two implementations ship with the crate:
//!
//! - [`ram::RamFs`]: a fixed-capacity in-memory tree built on `heapless`
//! - `host::HostFs` (feature `std`): a directory on the host filesystem
//!
//! ## Example
//!
//! ```rust
//! use sdhttpd::storage::{FileSystem, Mode, ram::RamFs};
//!
//! let mut fs: RamFs<8, 256> = RamFs::new();
//! fs.create_dir("/logs").unwrap();
//!
//! let mut file = fs.open("/logs/boot.txt", Mode::WriteTruncate).unwrap();
//! fs.write(&mut file, b"ok").unwrap();
//! fs.close(file).unwrap();
//!
//! assert_eq!(fs.read_file("logs/boot.txt"), Some(&b"ok"[..]));
//! ```

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error types for storage operations
pub mod error;

/// In-memory filesystem.
pub mod ram;

/// Host directory adapter.
#[cfg(feature = "std")]
pub mod host;


/// Re-exports of common traits for convenient importing
pub mod prelude {
    pub use super::{FileSystem, Mode};
}

/// How a path is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Open an existing file or directory for reading.
    Read,
    /// Create the file, or truncate it if it already exists.
    WriteTruncate,
}

/// A hierarchical filesystem addressed by path.
///
/// Implementations decide how much of the device a handle pins; callers must
/// hand every handle back through [`close`](FileSystem::close).
pub trait FileSystem {
    /// An open file or directory.
    type Handle;
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Opens `path`. Opening a missing path in [`Mode::Read`] fails.
    fn open(&mut self, path: &str, mode: Mode) -> Result<Self::Handle, Self::Error>;

    /// Returns `true` if the handle refers to a directory.
    fn is_dir(&self, handle: &Self::Handle) -> bool;

    /// Size of the file in bytes; directories report 0.
    fn size(&self, handle: &Self::Handle) -> u64;

    /// Reads from the current position. `Ok(0)` marks the end of the file.
    fn read(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes at the current position, returning how many bytes were taken.
    fn write(&mut self, handle: &mut Self::Handle, data: &[u8]) -> Result<usize, Self::Error>;

    /// Pushes buffered writes to the medium.
    fn flush(&mut self, handle: &mut Self::Handle) -> Result<(), Self::Error>;

    /// Restarts directory enumeration.
    fn rewind_dir(&mut self, dir: &mut Self::Handle) -> Result<(), Self::Error>;

    /// Copies the next entry's name into `name` and returns the full length
    /// of that name, or `None` after the last entry.
    ///
    /// When the returned length is larger than `name.len()`, only the first
    /// `name.len()` bytes were written.
    fn next_entry(
        &mut self,
        dir: &mut Self::Handle,
        name: &mut [u8],
    ) -> Result<Option<usize>, Self::Error>;

    /// Releases the handle.
    fn close(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;
}

/// Splits a root-relative path into its parent directory and final name.
///
/// Leading and trailing separators are ignored; the root is `""`.
pub fn split_path(path: &str) -> (&str, &str) {
    let path = path.trim_matches('/');
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}
