//! The capability contract shared by every filesystem the overlay composes.
//!
//! Both the primary and the secondary implement [`Backend`], and so does
//! [`CowFs`](crate::overlay::CowFs) itself, which lets overlays stack. Backend
//! errors are plain [`std::io::Error`] values so callers can inspect the
//! backend's own error detail after it passes through the overlay.

pub mod memory;
#[cfg(unix)]
pub mod os;

pub use memory::MemFs;
#[cfg(unix)]
pub use os::OsFs;

use bitflags::bitflags;
use std::io::{self, Read, Seek, Write};
use std::time::SystemTime;

bitflags! {
    /// Flags accepted by [`Backend::open_file`].
    ///
    /// The empty set opens read-only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const WRITE_ONLY = 0o1;
        const READ_WRITE = 0o2;
        const CREATE = 0o100;
        const EXCLUSIVE = 0o200;
        const TRUNCATE = 0o1000;
        const APPEND = 0o2000;
    }
}

impl OpenFlags {
    pub const READ_ONLY: OpenFlags = OpenFlags::empty();

    /// True if any flag routes the open to the overlay's write path.
    pub fn is_write(self) -> bool {
        self.intersects(
            OpenFlags::CREATE
                | OpenFlags::WRITE_ONLY
                | OpenFlags::READ_WRITE
                | OpenFlags::TRUNCATE
                | OpenFlags::APPEND,
        )
    }

    pub fn readable(self) -> bool {
        !self.contains(OpenFlags::WRITE_ONLY)
    }

    pub fn writable(self) -> bool {
        self.intersects(OpenFlags::WRITE_ONLY | OpenFlags::READ_WRITE | OpenFlags::APPEND)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

/// File information as reported by `stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Final path component (`/` for the root).
    pub name: String,
    pub kind: FileKind,
    /// Size in bytes (0 for directories on in-memory backends).
    pub size: u64,
    /// Permission bits, `mode & 0o7777`.
    pub mode: u32,
    pub modified: SystemTime,
    pub accessed: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// The rwx permission bits only.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o777
    }
}

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub metadata: Metadata,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// An open file or directory.
///
/// Directory handles answer `read_dir_entries` / `read_dir_names`; file
/// handles answer the byte-oriented operations. A handle is released when it
/// is dropped; `close` exists for callers that want to observe errors.
pub trait File: Read + Write + Seek + Send {
    /// The path this handle was opened with.
    fn name(&self) -> &str;

    fn stat(&self) -> io::Result<Metadata>;

    fn sync(&mut self) -> io::Result<()>;

    /// Read at `offset` without moving the handle's cursor.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Write at `offset` without moving the handle's cursor.
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize>;

    fn truncate(&mut self, size: u64) -> io::Result<()>;

    /// Read up to `n` directory entries; `n == 0` reads all remaining ones.
    /// An exhausted directory yields an empty vector.
    fn read_dir_entries(&mut self, n: usize) -> io::Result<Vec<DirEntry>>;

    fn read_dir_names(&mut self, n: usize) -> io::Result<Vec<String>> {
        Ok(self
            .read_dir_entries(n)?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Optional extended capability: a backend that knows its temp directory.
pub trait TempDir {
    fn temp_dir(&self) -> String;
}

/// Abstract filesystem operations.
///
/// Paths are slash-separated and interpreted relative to the backend's own
/// root; implementations normalize them with [`crate::path::normalize`].
pub trait Backend: Send + Sync {
    fn open_file(&self, path: &str, flags: OpenFlags, perm: u32) -> io::Result<Box<dyn File>>;

    fn mkdir(&self, path: &str, perm: u32) -> io::Result<()>;

    /// Remove a file or an empty directory.
    fn remove(&self, path: &str) -> io::Result<()>;

    fn rename(&self, old_path: &str, new_path: &str) -> io::Result<()>;

    fn stat(&self, path: &str) -> io::Result<Metadata>;

    fn chmod(&self, path: &str, mode: u32) -> io::Result<()>;

    fn chtimes(&self, path: &str, atime: SystemTime, mtime: SystemTime) -> io::Result<()>;

    fn chown(&self, path: &str, uid: u32, gid: u32) -> io::Result<()>;

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut dir = self.open_file(path, OpenFlags::READ_ONLY, 0)?;
        dir.read_dir_entries(0)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut file = self.open_file(path, OpenFlags::READ_ONLY, 0)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    /// Capability query for [`TempDir`]; `None` when the backend lacks it.
    fn as_temp_dir(&self) -> Option<&dyn TempDir> {
        None
    }
}

/// Hand out the next page of a cached directory listing.
///
/// `n == 0` returns everything from `offset` onwards. `offset` is advanced by
/// the number of entries returned.
pub(crate) fn paginate(entries: &[DirEntry], offset: &mut usize, n: usize) -> Vec<DirEntry> {
    let start = (*offset).min(entries.len());
    let end = if n == 0 {
        entries.len()
    } else {
        start.saturating_add(n).min(entries.len())
    };
    *offset = end;
    entries[start..end].to_vec()
}
