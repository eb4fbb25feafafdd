//! [`FileSystem`] over a directory of the host filesystem.

use super::{FileSystem, Mode};
use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};

/// Serves the tree below `root`. Paths containing `..` are refused.
#[derive(Debug)]
pub struct HostFs {
    root: PathBuf,
}

/// An open [`HostFs`] entry.
#[derive(Debug)]
pub enum HostHandle {
    /// A regular file and its size at open time.
    #[allow(missing_docs)]
    File { file: File, size: u64 },
    /// A directory and its enumeration, started on rewind.
    #[allow(missing_docs)]
    Dir { path: PathBuf, entries: Option<ReadDir> },
}

impl HostFs {
    /// Serves the tree under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The served directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(io::Error::new(
                        ErrorKind::InvalidInput,
                        "path escapes the served root",
                    ));
                }
            }
        }
        Ok(resolved)
    }
}

impl FileSystem for HostFs {
    type Handle = HostHandle;
    type Error = io::Error;

    fn open(&mut self, path: &str, mode: Mode) -> Result<Self::Handle, Self::Error> {
        let resolved = self.resolve(path)?;
        match mode {
            Mode::Read => {
                let metadata = fs::metadata(&resolved)?;
                if metadata.is_dir() {
                    Ok(HostHandle::Dir {
                        path: resolved,
                        entries: None,
                    })
                } else {
                    Ok(HostHandle::File {
                        file: File::open(&resolved)?,
                        size: metadata.len(),
                    })
                }
            }
            Mode::WriteTruncate => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&resolved)?;
                Ok(HostHandle::File { file, size: 0 })
            }
        }
    }

    fn is_dir(&self, handle: &Self::Handle) -> bool {
        matches!(handle, HostHandle::Dir { .. })
    }

    fn size(&self, handle: &Self::Handle) -> u64 {
        match handle {
            HostHandle::File { size, .. } => *size,
            HostHandle::Dir { .. } => 0,
        }
    }

    fn read(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match handle {
            HostHandle::File { file, .. } => file.read(buf),
            HostHandle::Dir { .. } => Err(io::Error::other("is a directory")),
        }
    }

    fn write(&mut self, handle: &mut Self::Handle, data: &[u8]) -> Result<usize, Self::Error> {
        match handle {
            HostHandle::File { file, size } => {
                let n = file.write(data)?;
                *size += n as u64;
                Ok(n)
            }
            HostHandle::Dir { .. } => Err(io::Error::other("is a directory")),
        }
    }

    fn flush(&mut self, handle: &mut Self::Handle) -> Result<(), Self::Error> {
        match handle {
            HostHandle::File { file, .. } => {
                file.flush()?;
                file.sync_data()
            }
            HostHandle::Dir { .. } => Ok(()),
        }
    }

    fn rewind_dir(&mut self, dir: &mut Self::Handle) -> Result<(), Self::Error> {
        match dir {
            HostHandle::Dir { path, entries } => {
                *entries = Some(fs::read_dir(&*path)?);
                Ok(())
            }
            HostHandle::File { .. } => Err(io::Error::other("not a directory")),
        }
    }

    fn next_entry(
        &mut self,
        dir: &mut Self::Handle,
        name: &mut [u8],
    ) -> Result<Option<usize>, Self::Error> {
        let HostHandle::Dir { path, entries } = dir else {
            return Err(io::Error::other("not a directory"));
        };
        if entries.is_none() {
            *entries = Some(fs::read_dir(&*path)?);
        }
        let Some(entries) = entries.as_mut() else {
            return Ok(None);
        };
        let Some(entry) = entries.next().transpose()? else {
            return Ok(None);
        };
        let file_name = entry.file_name();
        let bytes = file_name.as_encoded_bytes();
        let n = bytes.len().min(name.len());
        name[..n].copy_from_slice(&bytes[..n]);
        Ok(Some(bytes.len()))
    }

    fn close(&mut self, handle: Self::Handle) -> Result<(), Self::Error> {
        drop(handle);
        Ok(())
    }
}
