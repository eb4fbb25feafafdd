//! Fixed-capacity in-memory filesystem.
//!
//! `RamFs<NODES, CAPACITY>` holds up to `NODES` files and directories, each
//! file holding up to `CAPACITY` bytes. Nothing is allocated after
//! construction. The root directory is implicit.

use super::error::Error;
use super::{FileSystem, Mode, split_path};
use heapless::{String, Vec};

/// Longest root-relative path a node can have.
pub const MAX_PATH_LEN: usize = 128;

#[derive(Debug)]
enum Kind<const CAPACITY: usize> {
    Dir,
    File(Vec<u8, CAPACITY>),
}

#[derive(Debug)]
struct Node<const CAPACITY: usize> {
    path: String<MAX_PATH_LEN>,
    kind: Kind<CAPACITY>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Root,
    Node(usize),
}

/// An open [`RamFs`] entry.
#[derive(Debug)]
pub struct RamHandle {
    target: Target,
    position: usize,
    cursor: usize,
    writable: bool,
}

/// In-memory filesystem with a fixed node table.
#[derive(Debug)]
pub struct RamFs<const NODES: usize, const CAPACITY: usize> {
    nodes: Vec<Node<CAPACITY>, NODES>,
}

impl<const NODES: usize, const CAPACITY: usize> Default for RamFs<NODES, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const NODES: usize, const CAPACITY: usize> RamFs<NODES, CAPACITY> {
    /// An empty filesystem holding only the root directory.
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn find(&self, path: &str) -> Option<usize> {
        let path = path.trim_matches('/');
        self.nodes.iter().position(|node| node.path == path)
    }

    fn is_dir_path(&self, path: &str) -> bool {
        let path = path.trim_matches('/');
        path.is_empty()
            || self
                .find(path)
                .is_some_and(|index| matches!(self.nodes[index].kind, Kind::Dir))
    }

    fn insert(&mut self, path: &str, kind: Kind<CAPACITY>) -> Result<usize, Error> {
        let path = path.trim_matches('/');
        let (parent, name) = split_path(path);
        if name.is_empty() {
            return Err(Error::IsADirectory);
        }
        if !self.is_dir_path(parent) {
            return Err(if self.find(parent).is_some() {
                Error::NotADirectory
            } else {
                Error::NotFound
            });
        }
        let path = String::try_from(path).map_err(|_| Error::NameTooLong)?;
        self.nodes
            .push(Node { path, kind })
            .map_err(|_| Error::NoSpace)?;
        Ok(self.nodes.len() - 1)
    }

    /// Creates a directory; its parent must already exist.
    pub fn create_dir(&mut self, path: &str) -> Result<(), Error> {
        match self.find(path) {
            Some(index) => match self.nodes[index].kind {
                Kind::Dir => Ok(()),
                Kind::File(_) => Err(Error::NotADirectory),
            },
            None => self.insert(path, Kind::Dir).map(|_| ()),
        }
    }

    /// Creates or replaces a file with `data`.
    pub fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), Error> {
        let contents = Vec::from_slice(data).map_err(|_| Error::NoSpace)?;
        match self.find(path) {
            Some(index) => match &mut self.nodes[index].kind {
                Kind::File(existing) => {
                    *existing = contents;
                    Ok(())
                }
                Kind::Dir => Err(Error::IsADirectory),
            },
            None => self.insert(path, Kind::File(contents)).map(|_| ()),
        }
    }

    /// Contents of the file at `path`, if it exists.
    pub fn read_file(&self, path: &str) -> Option<&[u8]> {
        let index = self.find(path)?;
        match &self.nodes[index].kind {
            Kind::File(data) => Some(data),
            Kind::Dir => None,
        }
    }

    /// Returns `true` if a file or directory exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.is_dir_path(path) || self.find(path).is_some()
    }

    fn dir_path(&self, target: Target) -> Result<&str, Error> {
        match target {
            Target::Root => Ok(""),
            Target::Node(index) => match self.nodes[index].kind {
                Kind::Dir => Ok(self.nodes[index].path.as_str()),
                Kind::File(_) => Err(Error::NotADirectory),
            },
        }
    }
}

impl<const NODES: usize, const CAPACITY: usize> FileSystem for RamFs<NODES, CAPACITY> {
    type Handle = RamHandle;
    type Error = Error;

    fn open(&mut self, path: &str, mode: Mode) -> Result<Self::Handle, Self::Error> {
        let existing = if path.trim_matches('/').is_empty() {
            Some(Target::Root)
        } else {
            self.find(path).map(Target::Node)
        };

        let target = match (mode, existing) {
            (Mode::Read, Some(target)) => target,
            (Mode::Read, None) => return Err(Error::NotFound),
            (Mode::WriteTruncate, Some(Target::Root)) => return Err(Error::IsADirectory),
            (Mode::WriteTruncate, Some(Target::Node(index))) => match &mut self.nodes[index].kind
            {
                Kind::File(data) => {
                    data.clear();
                    Target::Node(index)
                }
                Kind::Dir => return Err(Error::IsADirectory),
            },
            (Mode::WriteTruncate, None) => Target::Node(self.insert(path, Kind::File(Vec::new()))?),
        };

        Ok(RamHandle {
            target,
            position: 0,
            cursor: 0,
            writable: mode == Mode::WriteTruncate,
        })
    }

    fn is_dir(&self, handle: &Self::Handle) -> bool {
        match handle.target {
            Target::Root => true,
            Target::Node(index) => matches!(self.nodes[index].kind, Kind::Dir),
        }
    }

    fn size(&self, handle: &Self::Handle) -> u64 {
        match handle.target {
            Target::Root => 0,
            Target::Node(index) => match &self.nodes[index].kind {
                Kind::File(data) => data.len() as u64,
                Kind::Dir => 0,
            },
        }
    }

    fn read(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Target::Node(index) = handle.target else {
            return Err(Error::IsADirectory);
        };
        let Kind::File(data) = &self.nodes[index].kind else {
            return Err(Error::IsADirectory);
        };
        let remaining = data.get(handle.position..).unwrap_or_default();
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        handle.position += n;
        Ok(n)
    }

    fn write(&mut self, handle: &mut Self::Handle, data: &[u8]) -> Result<usize, Self::Error> {
        if !handle.writable {
            return Err(Error::ReadOnly);
        }
        let Target::Node(index) = handle.target else {
            return Err(Error::IsADirectory);
        };
        let Kind::File(contents) = &mut self.nodes[index].kind else {
            return Err(Error::IsADirectory);
        };
        let n = data.len().min(CAPACITY - contents.len());
        if n == 0 && !data.is_empty() {
            return Err(Error::NoSpace);
        }
        // Capacity was checked above.
        let _ = contents.extend_from_slice(&data[..n]);
        handle.position += n;
        Ok(n)
    }

    fn flush(&mut self, _handle: &mut Self::Handle) -> Result<(), Self::Error> {
        Ok(())
    }

    fn rewind_dir(&mut self, dir: &mut Self::Handle) -> Result<(), Self::Error> {
        self.dir_path(dir.target)?;
        dir.cursor = 0;
        Ok(())
    }

    fn next_entry(
        &mut self,
        dir: &mut Self::Handle,
        name: &mut [u8],
    ) -> Result<Option<usize>, Self::Error> {
        let dir_path = self.dir_path(dir.target)?;
        while dir.cursor < self.nodes.len() {
            let node = &self.nodes[dir.cursor];
            dir.cursor += 1;
            let (parent, entry) = split_path(&node.path);
            if parent == dir_path {
                let bytes = entry.as_bytes();
                let n = bytes.len().min(name.len());
                name[..n].copy_from_slice(&bytes[..n]);
                return Ok(Some(bytes.len()));
            }
        }
        Ok(None)
    }

    fn close(&mut self, _handle: Self::Handle) -> Result<(), Self::Error> {
        Ok(())
    }
}
