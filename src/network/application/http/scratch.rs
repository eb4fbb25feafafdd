//! Scratch buffer layout during an upload.
//!
//! ```text
//! [ destination prefix | part headers ........................ ]
//!                      ^ prefix_len
//! ```
//!
//! The destination directory (for example `uploads/`) stays at the front for
//! the whole body. After it, each part's header values are collected while
//! the headers stream in. Once they are complete the filename is copied down
//! to sit right after the prefix, forming the path that gets opened. The
//! next part starts collecting headers over it again.

use core::ops::Range;

#[derive(Debug)]
pub(crate) struct UploadScratch<'a> {
    buf: &'a mut [u8],
    prefix_len: usize,
    header_len: usize,
    truncated: bool,
    path_len: Option<usize>,
}

impl<'a> UploadScratch<'a> {
    /// `buf[..prefix_len]` must already hold the destination prefix.
    pub fn new(buf: &'a mut [u8], prefix_len: usize) -> Self {
        let prefix_len = prefix_len.min(buf.len());
        Self {
            buf,
            prefix_len,
            header_len: 0,
            truncated: false,
            path_len: None,
        }
    }

    /// Forgets the previous part's headers and path.
    pub fn begin_part(&mut self) {
        self.header_len = 0;
        self.truncated = false;
        self.path_len = None;
    }

    /// Appends header bytes. Bytes past the end of the buffer are dropped and
    /// the headers are marked truncated.
    pub fn capture_header(&mut self, bytes: &[u8]) {
        let start = self.prefix_len + self.header_len;
        let room = self.buf.len() - start;
        let n = bytes.len().min(room);
        self.buf[start..start + n].copy_from_slice(&bytes[..n]);
        self.header_len += n;
        if n < bytes.len() {
            self.truncated = true;
        }
    }

    pub fn headers(&self) -> &[u8] {
        &self.buf[self.prefix_len..self.prefix_len + self.header_len]
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Moves `name` (a range within [`headers`](Self::headers)) next to the
    /// prefix and returns the joined path.
    ///
    /// The header bytes are overwritten, so this is the last look at them.
    pub fn target_path(&mut self, name: Range<usize>) -> &[u8] {
        let len = name.len();
        let src = self.prefix_len + name.start..self.prefix_len + name.end;
        self.buf.copy_within(src, self.prefix_len);
        self.header_len = 0;
        self.path_len = Some(self.prefix_len + len);
        &self.buf[..self.prefix_len + len]
    }

    /// The path produced by the last [`target_path`](Self::target_path) in
    /// this part, if any.
    pub fn staged_path(&self) -> Option<&[u8]> {
        self.path_len.map(|len| &self.buf[..len])
    }
}
