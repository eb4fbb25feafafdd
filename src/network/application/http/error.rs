//! Server error type.

use crate::network::error::Error as NetworkError;

/// Errors raised while serving a request.
///
/// Most failures never reach the client as anything more specific than a
/// 404 or the post-upload redirect; these variants exist for the embedding
/// firmware and the logs.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The transport failed or the peer went away.
    Network(NetworkError),
    /// The filesystem refused an operation.
    Storage,
    /// The upload request carried no `boundary=` parameter.
    MissingBoundary,
    /// The boundary was empty or longer than [`MAX_BOUNDARY_LEN`](super::multipart::MAX_BOUNDARY_LEN).
    InvalidBoundary,
    /// The buffers handed to the server cannot work together.
    InvalidConfig,
    /// The acceptor failed while waiting for a client.
    Accept,
}

impl From<NetworkError> for Error {
    fn from(error: NetworkError) -> Self {
        Error::Network(error)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Network(e) => write!(f, "network: {}", e),
            Error::Storage => f.write_str("storage operation failed"),
            Error::MissingBoundary => f.write_str("multipart boundary missing"),
            Error::InvalidBoundary => f.write_str("multipart boundary invalid"),
            Error::InvalidConfig => f.write_str("invalid buffer configuration"),
            Error::Accept => f.write_str("accept failed"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Network(e) => defmt::write!(f, "Network({})", e),
            Error::Storage => defmt::write!(f, "Storage"),
            Error::MissingBoundary => defmt::write!(f, "MissingBoundary"),
            Error::InvalidBoundary => defmt::write!(f, "InvalidBoundary"),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
            Error::Accept => defmt::write!(f, "Accept"),
        }
    }
}
