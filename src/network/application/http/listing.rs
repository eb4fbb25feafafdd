//! Directory listing pages.
//!
//! A listing is a chunked `text/html` body: a fixed preamble carrying an
//! inline favicon and the upload form, one link per entry, and a closing
//! tag. Each link is sent as a single chunk assembled from borrowed pieces,
//! so nothing beyond the entry name is ever buffered.

use super::error::Error;
use super::response::{Body, ChunkedWriter, Head, Status};
use crate::network::Write;
use crate::storage::FileSystem;

/// Everything before the first entry. The form posts back to the listed
/// directory, which is where the upload lands.
pub const PREAMBLE: &str = concat!(
    "<!DOCTYPE html><html><head>",
    "<link rel=\"icon\" href=\"data:image/png;base64,",
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVQI12P4//8/AAX+Av7czFnnAAAAAElFTkSuQmCC",
    "\"></head><body>",
    "<form method=\"post\" enctype=\"multipart/form-data\">",
    "<label>Upload file to this folder: </label><br/>",
    "<input type=\"file\" name=\"file\" required/><br/>",
    "<input type=\"submit\"/></form><br/>",
);

/// Final chunk of every listing.
pub const CLOSING: &str = "</body></html>\n";

/// Bytes that would need percent-encoding inside a link.
const RESERVED: &[u8] = b"!*'();:@&=+$,/?#[] ";

/// `true` if `name` can be linked verbatim.
///
/// Entries containing reserved characters are left out of listings. They can
/// still be fetched by typing an encoded URL.
pub fn is_listable(name: &[u8]) -> bool {
    !name.iter().any(|b| RESERVED.contains(b))
}

/// What a listing sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Entries linked.
    pub listed: u16,
    /// Entries left out.
    pub hidden: u16,
}

/// Writes the listing page for `dir`.
///
/// `dir_path` is the decoded request path and prefixes every link. Entry names
/// are read into `name_buf`; names that do not fit are skipped. The directory
/// is rewound before and after enumeration.
pub fn render<W, F>(
    writer: &mut W,
    fs: &mut F,
    dir: &mut F::Handle,
    dir_path: &[u8],
    name_buf: &mut [u8],
) -> Result<Summary, Error>
where
    W: Write + ?Sized,
    F: FileSystem,
{
    Head {
        status: Status::Ok,
        content_type: "text/html",
        body: Body::Chunked,
        location: None,
    }
    .write_to(writer)?;

    let mut chunks = ChunkedWriter::new(writer);
    chunks.chunk(&[PREAMBLE.as_bytes()])?;

    let separator: &[u8] = if dir_path.last() == Some(&b'/') { b"" } else { b"/" };
    let mut summary = Summary::default();

    if fs.rewind_dir(dir).is_err() {
        warn!("directory rewind failed");
    } else {
        loop {
            let len = match fs.next_entry(dir, name_buf) {
                Ok(Some(len)) => len,
                Ok(None) => break,
                Err(_) => {
                    warn!("directory enumeration stopped early");
                    break;
                }
            };
            if len > name_buf.len() {
                summary.hidden = summary.hidden.saturating_add(1);
                continue;
            }
            let name = &name_buf[..len];
            if !is_listable(name) {
                trace!("hiding entry of {} bytes", len);
                summary.hidden = summary.hidden.saturating_add(1);
                continue;
            }
            chunks.chunk(&[
                b"<a href=\"",
                dir_path,
                separator,
                name,
                b"\">",
                name,
                b"</a><br/>",
            ])?;
            summary.listed = summary.listed.saturating_add(1);
        }
        let _ = fs.rewind_dir(dir);
    }

    chunks.chunk(&[CLOSING.as_bytes()])?;
    chunks.finish()?;

    debug!("listed {} entries, hid {}", summary.listed, summary.hidden);
    Ok(summary)
}
