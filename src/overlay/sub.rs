//! Subtree view of a backend.

use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use crate::backend::{Backend, DirEntry, File, Metadata, OpenFlags, TempDir};
use crate::path::{self, ROOT};

/// A [`Backend`] that exposes the subtree of `parent` rooted at a directory.
///
/// Paths are normalized before they are prefixed, so `..` cannot climb out
/// of the subtree.
pub struct SubFs {
    parent: Arc<dyn Backend>,
    root: String,
}

impl SubFs {
    /// Fails with `NotFound` if `dir` does not exist in `parent` and
    /// `NotADirectory` if it is a file.
    pub fn new(parent: Arc<dyn Backend>, dir: &str) -> io::Result<Self> {
        let root = path::normalize(dir);
        if !parent.stat(&root)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", root),
            ));
        }
        Ok(SubFs { parent, root })
    }

    /// The subtree root, as a path in the parent backend.
    pub fn root(&self) -> &str {
        &self.root
    }

    fn resolve(&self, path: &str) -> String {
        path::join(&self.root, &path::normalize(path))
    }
}

impl Backend for SubFs {
    fn open_file(&self, path: &str, flags: OpenFlags, perm: u32) -> io::Result<Box<dyn File>> {
        self.parent.open_file(&self.resolve(path), flags, perm)
    }

    fn mkdir(&self, path: &str, perm: u32) -> io::Result<()> {
        self.parent.mkdir(&self.resolve(path), perm)
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        if path::normalize(path) == ROOT {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot remove subtree root: {}", self.root),
            ));
        }
        self.parent.remove(&self.resolve(path))
    }

    fn rename(&self, old_path: &str, new_path: &str) -> io::Result<()> {
        self.parent
            .rename(&self.resolve(old_path), &self.resolve(new_path))
    }

    fn stat(&self, path: &str) -> io::Result<Metadata> {
        self.parent.stat(&self.resolve(path))
    }

    fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        self.parent.chmod(&self.resolve(path), mode)
    }

    fn chtimes(&self, path: &str, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        self.parent.chtimes(&self.resolve(path), atime, mtime)
    }

    fn chown(&self, path: &str, uid: u32, gid: u32) -> io::Result<()> {
        self.parent.chown(&self.resolve(path), uid, gid)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.parent.read_dir(&self.resolve(path))
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.parent.read_file(&self.resolve(path))
    }

    fn as_temp_dir(&self) -> Option<&dyn TempDir> {
        self.parent.as_temp_dir()
    }
}
