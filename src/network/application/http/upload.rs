//! Multipart upload ingestion.
//!
//! A POST body is consumed in three steps:
//!
//! 1. the request headers are scanned for `boundary=` and the rest of that
//!    line is taken as the boundary;
//! 2. everything up to the blank line ending the headers is discarded;
//! 3. the body is read in streaming-buffer sized chunks and fed to a
//!    [`MultipartParser`] whose handler writes each file part to storage.
//!
//! Only parts whose headers carry `filename="..."` are stored. They land in
//! the directory named by the request target, under their own name.

use super::error::Error;
use super::multipart::{MultipartParser, PartHandler};
use super::request::find;
use super::scratch::UploadScratch;
use super::server::Options;
use crate::network::Read;
use crate::network::stream::{read_until, skip_past};
use crate::storage::{FileSystem, Mode};
use core::ops::ControlFlow;

const FILENAME: &[u8] = b"filename=\"";

/// What one upload request stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Files written and closed.
    pub files_written: u16,
    /// Body bytes across those files.
    pub bytes_written: u64,
    /// Parts that named a file but could not be stored.
    pub parts_skipped: u16,
    /// The closing delimiter was seen.
    pub complete: bool,
}

#[cfg(feature = "defmt")]
impl defmt::Format for UploadReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "UploadReport files_written={} bytes_written={} parts_skipped={} complete={}",
            self.files_written,
            self.bytes_written,
            self.parts_skipped,
            self.complete
        )
    }
}

/// Rewrites the decoded request path in `buf[..len]` into the directory
/// prefix uploads are stored under, returning the new length.
///
/// The leading `/` is dropped and a trailing `/` added to non-empty paths, so
/// `/uploads` and `/uploads/` both become `uploads/` and `/` becomes the empty
/// prefix. Returns `None` if there is no room for the trailing `/`.
pub fn destination_prefix(buf: &mut [u8], len: usize) -> Option<usize> {
    let mut len = len.min(buf.len());
    if len > 0 && buf[0] == b'/' {
        buf.copy_within(1..len, 0);
        len -= 1;
    }
    if len > 0 && buf[len - 1] != b'/' {
        if len == buf.len() {
            return None;
        }
        buf[len] = b'/';
        len += 1;
    }
    Some(len)
}

/// Reads a multipart body from `conn` and stores its file parts.
///
/// `scratch[..prefix_len]` must hold the destination prefix (see
/// [`destination_prefix`]); the rest of `scratch` holds the boundary and then
/// each part's headers. `streaming` receives the body chunks.
///
/// Only a missing or unusable boundary is an error. Once the body is being
/// parsed, read failures, framing errors and the size limit end the upload
/// early and are reported through [`UploadReport::complete`].
pub fn ingest<C, F>(
    conn: &mut C,
    fs: &mut F,
    scratch: &mut [u8],
    prefix_len: usize,
    streaming: &mut [u8],
    options: &Options,
) -> Result<UploadReport, Error>
where
    C: Read + ?Sized,
    F: FileSystem,
{
    if !skip_past(conn, b"boundary=", 0)? {
        return Err(Error::MissingBoundary);
    }

    let prefix_len = prefix_len.min(scratch.len());
    let mut parser = {
        let line = &mut scratch[prefix_len..];
        let n = read_until(conn, b'\n', line)?;
        MultipartParser::new(trim_boundary(&line[..n]))?
    };

    // The line break after the boundary was the first half of "\r\n\r\n".
    if !skip_past(conn, b"\r\n\r\n", 2)? {
        warn!("request ended before the upload body");
        return Ok(UploadReport::default());
    }

    let mut ingestor = Ingestor {
        fs,
        scratch: UploadScratch::new(scratch, prefix_len),
        target: None,
        report: UploadReport::default(),
    };

    let mut received = 0u64;
    loop {
        let n = match conn.read(streaming) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => {
                warn!("read failed after {} body bytes", received);
                break;
            }
        };
        received += n as u64;
        if let Some(limit) = options.max_upload_bytes {
            if received > limit {
                warn!("upload exceeds {} bytes, aborting", limit);
                break;
            }
        }

        let consumed = parser.feed(&streaming[..n], &mut ingestor);
        if consumed < n {
            warn!("malformed multipart body near byte {}", received - (n - consumed) as u64);
            break;
        }
        if parser.is_finished() {
            break;
        }
    }

    let mut report = ingestor.finish();
    report.complete = parser.is_finished();
    Ok(report)
}

fn trim_boundary(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match line {
        [b'"', inner @ .., b'"'] => inner,
        _ => line,
    }
}

/// `true` for a plain file name that stays inside the upload directory.
fn is_acceptable_name(name: &[u8]) -> bool {
    !name.is_empty()
        && name != b"."
        && name != b".."
        && !name.iter().any(|&b| matches!(b, b'/' | b'\\' | 0))
}

struct Target<H> {
    handle: H,
    written: u64,
    crc: crc32fast::Hasher,
}

struct Ingestor<'s, 'f, F: FileSystem> {
    fs: &'f mut F,
    scratch: UploadScratch<'s>,
    target: Option<Target<F::Handle>>,
    report: UploadReport,
}

impl<F: FileSystem> Ingestor<'_, '_, F> {
    fn skip(&mut self) {
        self.report.parts_skipped = self.report.parts_skipped.saturating_add(1);
    }

    fn staged_path(&self) -> &str {
        self.scratch
            .staged_path()
            .and_then(|path| core::str::from_utf8(path).ok())
            .unwrap_or("")
    }

    /// Closes an unfinished target. The partial file stays on storage.
    fn abandon(&mut self) {
        if let Some(target) = self.target.take() {
            warn!(
                "abandoning {} after {} bytes",
                self.staged_path(),
                target.written
            );
            let _ = self.fs.close(target.handle);
            self.skip();
        }
    }

    fn open_target(&mut self) {
        if self.scratch.is_truncated() {
            warn!("part headers exceed the scratch buffer, skipping part");
            self.skip();
            return;
        }

        let headers = self.scratch.headers();
        let Some(start) = find(headers, FILENAME).map(|at| at + FILENAME.len()) else {
            trace!("part without a file");
            return;
        };
        let Some(len) = headers[start..].iter().position(|&b| b == b'"') else {
            warn!("unterminated filename, skipping part");
            self.skip();
            return;
        };
        if len == 0 {
            trace!("form submitted without a file");
            return;
        }
        if !is_acceptable_name(&headers[start..start + len]) {
            warn!("rejected upload name of {} bytes", len);
            self.skip();
            return;
        }

        let path = self.scratch.target_path(start..start + len);
        let Ok(path) = core::str::from_utf8(path) else {
            warn!("upload name is not UTF-8, skipping part");
            self.skip();
            return;
        };
        match self.fs.open(path, Mode::WriteTruncate) {
            Ok(handle) => {
                debug!("receiving {}", path);
                self.target = Some(Target {
                    handle,
                    written: 0,
                    crc: crc32fast::Hasher::new(),
                });
            }
            Err(_) => {
                warn!("cannot open {} for writing, skipping part", path);
                self.skip();
            }
        }
    }

    fn store(&mut self, data: &[u8]) -> Result<(), F::Error> {
        let Some(target) = self.target.as_mut() else {
            return Ok(());
        };
        let mut rest = data;
        while !rest.is_empty() {
            let n = self.fs.write(&mut target.handle, rest)?;
            if n == 0 {
                break;
            }
            rest = &rest[n..];
        }
        self.fs.flush(&mut target.handle)?;

        let stored = &data[..data.len() - rest.len()];
        target.crc.update(stored);
        target.written += stored.len() as u64;
        if rest.is_empty() {
            Ok(())
        } else {
            // The device is full; keep what fit and drop the rest of the part.
            warn!("storage full after {} bytes", target.written);
            if let Some(target) = self.target.take() {
                let _ = self.fs.close(target.handle);
                self.skip();
            }
            Ok(())
        }
    }

    fn complete_target(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        let crc = target.crc.finalize();
        let written = target.written;
        if self.fs.close(target.handle).is_err() {
            warn!("closing {} failed", self.staged_path());
            self.skip();
            return;
        }
        info!(
            "stored {} ({} bytes, crc32 {})",
            self.staged_path(),
            written,
            crc
        );
        self.report.files_written = self.report.files_written.saturating_add(1);
        self.report.bytes_written += written;
    }

    fn finish(mut self) -> UploadReport {
        self.abandon();
        info!(
            "upload finished: {} files, {} bytes, {} skipped",
            self.report.files_written,
            self.report.bytes_written,
            self.report.parts_skipped
        );
        self.report
    }
}

impl<F: FileSystem> PartHandler for Ingestor<'_, '_, F> {
    fn on_part_begin(&mut self) -> ControlFlow<()> {
        self.abandon();
        self.scratch.begin_part();
        ControlFlow::Continue(())
    }

    fn on_header_value(&mut self, value: &[u8]) -> ControlFlow<()> {
        self.scratch.capture_header(value);
        ControlFlow::Continue(())
    }

    fn on_headers_complete(&mut self) -> ControlFlow<()> {
        self.open_target();
        ControlFlow::Continue(())
    }

    fn on_part_data(&mut self, data: &[u8]) -> ControlFlow<()> {
        if self.store(data).is_err() {
            warn!("write failed");
            self.abandon();
        }
        ControlFlow::Continue(())
    }

    fn on_part_data_end(&mut self) -> ControlFlow<()> {
        self.complete_target();
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(path: &str, capacity: usize) -> Option<std::string::String> {
        let mut buf = std::vec![0u8; capacity];
        buf[..path.len()].copy_from_slice(path.as_bytes());
        destination_prefix(&mut buf, path.len())
            .map(|n| std::string::String::from_utf8(buf[..n].to_vec()).unwrap())
    }

    #[test]
    fn test_destination_prefix() {
        assert_eq!(prefix("/", 16).as_deref(), Some(""));
        assert_eq!(prefix("/uploads", 16).as_deref(), Some("uploads/"));
        assert_eq!(prefix("/uploads/", 16).as_deref(), Some("uploads/"));
        assert_eq!(prefix("/a/b", 16).as_deref(), Some("a/b/"));
        assert_eq!(prefix("", 16).as_deref(), Some(""));
    }

    #[test]
    fn test_destination_prefix_needs_room_for_separator() {
        assert_eq!(prefix("abc", 3), None);
        assert_eq!(prefix("/abc", 4).as_deref(), Some("abc/"));
    }

    #[test]
    fn test_trim_boundary() {
        assert_eq!(trim_boundary(b"----abc\r"), b"----abc");
        assert_eq!(trim_boundary(b"\"quoted\"\r"), b"quoted");
        assert_eq!(trim_boundary(b"plain"), b"plain");
        assert_eq!(trim_boundary(b"\""), b"\"");
    }

    #[test]
    fn test_upload_names() {
        assert!(is_acceptable_name(b"a.txt"));
        assert!(is_acceptable_name(b"my file (1).txt"));
        assert!(is_acceptable_name(b"..hidden"));
        assert!(!is_acceptable_name(b""));
        assert!(!is_acceptable_name(b"."));
        assert!(!is_acceptable_name(b".."));
        assert!(!is_acceptable_name(b"../etc/passwd"));
        assert!(!is_acceptable_name(b"dir\\file"));
    }
}
