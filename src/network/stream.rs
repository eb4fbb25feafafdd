//! Blocking byte-stream helpers.
//!
//! Transports only implement bulk [`Read::read`]/[`Write::write`]; the
//! line-oriented parts of the server need single bytes, delimiter-bounded
//! reads and "skip until this pattern" scans, which live here. Every helper
//! maps the transport's own error type onto [`Error`].

use super::error::Error;
use super::{Read, Write};

/// Reads exactly one byte. `Ok(None)` means the stream has ended.
pub fn read_byte<R: Read + ?Sized>(reader: &mut R) -> Result<Option<u8>, Error> {
    let mut byte = [0u8; 1];
    match reader.read(&mut byte) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(byte[0])),
        Err(_) => Err(Error::ReadError),
    }
}

/// Reads bytes into `buf` until `delimiter` is seen, `buf` is full or the
/// stream ends, returning the number of bytes stored.
///
/// The delimiter is consumed but not stored. Once `buf` is full the remaining
/// bytes of the line are left unread.
pub fn read_until<R: Read + ?Sized>(
    reader: &mut R,
    delimiter: u8,
    buf: &mut [u8],
) -> Result<usize, Error> {
    let mut len = 0;
    while len < buf.len() {
        match read_byte(reader)? {
            None => break,
            Some(byte) if byte == delimiter => break,
            Some(byte) => {
                buf[len] = byte;
                len += 1;
            }
        }
    }
    Ok(len)
}

/// Discards bytes until `needle` has been read in full.
///
/// `matched` is the length of a prefix of `needle` the caller has already
/// consumed. Returns `Ok(false)` if the stream ends first.
///
/// On a mismatch the scan restarts at the current byte, which is exact for
/// needles whose only self-overlap is their first byte (`boundary=`,
/// `\r\n\r\n`).
pub fn skip_past<R: Read + ?Sized>(
    reader: &mut R,
    needle: &[u8],
    mut matched: usize,
) -> Result<bool, Error> {
    while matched < needle.len() {
        let Some(byte) = read_byte(reader)? else {
            return Ok(false);
        };
        if byte == needle[matched] {
            matched += 1;
        } else if byte == needle[0] {
            matched = 1;
        } else {
            matched = 0;
        }
    }
    Ok(true)
}

/// Writes all of `data`, retrying short writes.
pub fn write_all<W: Write + ?Sized>(writer: &mut W, mut data: &[u8]) -> Result<(), Error> {
    while !data.is_empty() {
        match writer.write(data) {
            Ok(0) => return Err(Error::WriteError),
            Ok(n) => data = &data[n..],
            Err(_) => return Err(Error::WriteError),
        }
    }
    Ok(())
}
