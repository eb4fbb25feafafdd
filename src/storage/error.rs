//! Common error types for storage operations

/// A common error type for storage operations.
///
/// This enum defines a set of common errors that can occur when working with
/// filesystems. It is designed to be simple and portable for `no_std`
/// environments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The path does not exist.
    NotFound,
    /// A directory operation was attempted on a file.
    NotADirectory,
    /// A file operation was attempted on a directory.
    IsADirectory,
    /// The device or the entry table is full.
    NoSpace,
    /// The path does not fit in the entry name storage.
    NameTooLong,
    /// A write was attempted through a handle opened for reading.
    ReadOnly,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Error::NotFound => "not found",
            Error::NotADirectory => "not a directory",
            Error::IsADirectory => "is a directory",
            Error::NoSpace => "no space left",
            Error::NameTooLong => "name too long",
            Error::ReadOnly => "handle is read-only",
        };
        f.write_str(text)
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotFound => defmt::write!(f, "NotFound"),
            Error::NotADirectory => defmt::write!(f, "NotADirectory"),
            Error::IsADirectory => defmt::write!(f, "IsADirectory"),
            Error::NoSpace => defmt::write!(f, "NoSpace"),
            Error::NameTooLong => defmt::write!(f, "NameTooLong"),
            Error::ReadOnly => defmt::write!(f, "ReadOnly"),
        }
    }
}
