//! File download responses.

use super::error::Error;
use super::response::{Body, Head, Status};
use crate::network::Write;
use crate::network::error::Error as NetworkError;
use crate::network::stream::write_all;
use crate::storage::FileSystem;

/// Sends `handle` as a `200 OK` body, using `buf` as the copy buffer.
///
/// `Content-Length` comes from the file size at open time. Returns the number
/// of body bytes written; if the file shrinks underneath us the response is
/// short and the client sees a truncated body.
pub fn respond<W, F>(
    writer: &mut W,
    fs: &mut F,
    handle: &mut F::Handle,
    buf: &mut [u8],
) -> Result<u64, Error>
where
    W: Write + ?Sized,
    F: FileSystem,
{
    let size = fs.size(handle);
    Head {
        status: Status::Ok,
        content_type: "application/octet-stream",
        body: Body::Length(size),
        location: None,
    }
    .write_to(writer)?;

    let mut sent = 0u64;
    while sent < size {
        let n = fs.read(handle, buf).map_err(|_| Error::Storage)?;
        if n == 0 {
            break;
        }
        let n = n.min((size - sent).min(usize::MAX as u64) as usize);
        write_all(writer, &buf[..n])?;
        sent += n as u64;
    }
    writer.flush().map_err(|_| NetworkError::WriteError)?;

    debug!("sent {} of {} bytes", sent, size);
    Ok(sent)
}
