//! # Application Layer Protocols
//!
//! Protocols that run on top of an accepted [`Connection`](crate::network::Connection).
//!
//! ## Available Protocols
//!
//! - **[`http`]**: HTTP/1.1 file server with directory listings and
//!   multipart uploads
//!
//! ## Design Principles
//!
//! - **Connection Agnostic**: Work with any type implementing [`Connection`](crate::network::Connection)
//! - **No-std Compatible**: No heap allocation; all working memory is borrowed
//!   from the caller or sized at compile time
//! - **Serial**: One connection is handled start to finish before the next

/// HTTP/1.1 server.
pub mod http;
