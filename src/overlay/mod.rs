//! Copy-on-write overlay of a read-only primary and a writable secondary.
//!
//! Reads fall through to the primary until a path is written, at which point
//! its content is copied up into the secondary and served from there.
//! Removals are recorded in [`OverlayState`] instead of touching the primary.

pub mod copy_up;
pub mod merge;
pub mod state;
pub mod sub;

pub use copy_up::copy_up;
pub use merge::{DirectoryMerger, MergedDir};
pub use state::{OverlayState, PathStatus};
pub use sub::SubFs;

use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use crate::backend::{Backend, DirEntry, File, Metadata, OpenFlags, TempDir};
use crate::config::OverlayConfig;
use crate::error::{is_not_found, not_found};
use crate::path::{self, ROOT};

pub struct CowFs {
    pub(crate) primary: Arc<dyn Backend>,
    pub(crate) secondary: Arc<dyn Backend>,
    pub(crate) state: Arc<OverlayState>,
    pub(crate) copy_up_locks: Arc<RwLock<FxHashMap<String, Arc<Mutex<()>>>>>,
    pub(crate) config: OverlayConfig,
}

impl CowFs {
    pub fn new(primary: Arc<dyn Backend>, secondary: Arc<dyn Backend>) -> Self {
        Self::with_config(primary, secondary, &OverlayConfig::default())
    }

    pub fn with_config(
        primary: Arc<dyn Backend>,
        secondary: Arc<dyn Backend>,
        config: &OverlayConfig,
    ) -> Self {
        CowFs {
            primary,
            secondary,
            state: Arc::new(OverlayState::new()),
            copy_up_locks: Arc::new(RwLock::new(FxHashMap::default())),
            config: config.clone(),
        }
    }

    pub fn primary(&self) -> &Arc<dyn Backend> {
        &self.primary
    }

    pub fn secondary(&self) -> &Arc<dyn Backend> {
        &self.secondary
    }

    /// Status recorded for exactly `path`.
    pub fn status_of(&self, path: &str) -> PathStatus {
        self.state.status_of(path)
    }

    /// Every path the overlay has modified or removed, sorted.
    pub fn changes(&self) -> Vec<(String, PathStatus)> {
        self.state.snapshot()
    }

    pub fn merger(&self) -> DirectoryMerger {
        DirectoryMerger::new(
            Arc::clone(&self.primary),
            Arc::clone(&self.secondary),
            Arc::clone(&self.state),
        )
    }

    /// View of the subtree rooted at `dir`. Changes made through the view
    /// land in this overlay.
    pub fn sub(self: &Arc<Self>, dir: &str) -> io::Result<SubFs> {
        SubFs::new(Arc::clone(self) as Arc<dyn Backend>, dir)
    }

    /// Truncate `path` to `size` bytes, copying it up first.
    pub fn truncate(&self, path: &str, size: u64) -> io::Result<()> {
        self.modify(path, "truncate", |secondary, path| {
            let mut file = secondary.open_file(path, OpenFlags::WRITE_ONLY, 0)?;
            file.truncate(size)
        })
    }

    /// Shared sequence for operations that change an existing path: refuse
    /// removed paths, copy up, delegate to the secondary, then record the
    /// modification. State is untouched if any step fails.
    fn modify<F>(&self, path: &str, op: &str, apply: F) -> io::Result<()>
    where
        F: FnOnce(&dyn Backend, &str) -> io::Result<()>,
    {
        let path = path::normalize(path);
        tracing::debug!("{}(path={})", op, path);

        self.with_copy_up_lock(&path, || {
            if self.state.effective_status(&path) == PathStatus::Deleted {
                return Err(not_found(&path));
            }
            self.copy_up_path(&path)?;
            apply(self.secondary.as_ref(), &path)?;
            self.state.mark_modified(&path);
            Ok(())
        })
    }

    fn open_for_read(&self, path: &str, flags: OpenFlags) -> io::Result<Box<dyn File>> {
        let file = match self.state.effective_status(path) {
            PathStatus::Deleted => return Err(not_found(path)),
            PathStatus::Modified => self.secondary.open_file(path, flags, 0)?,
            PathStatus::Untouched => match self.primary.open_file(path, flags, 0) {
                Ok(file) => file,
                Err(e) => {
                    tracing::trace!("open {} on primary failed ({}), trying secondary", path, e);
                    self.secondary.open_file(path, flags, 0)?
                }
            },
        };

        if file.stat().is_ok_and(|meta| meta.is_dir()) {
            return Ok(Box::new(MergedDir::new(file, self.merger(), path)));
        }
        Ok(file)
    }

    fn open_for_write(
        &self,
        path: &str,
        flags: OpenFlags,
        perm: u32,
    ) -> io::Result<Box<dyn File>> {
        self.with_copy_up_lock(path, || {
            let mut flags = flags;
            let status = self.state.effective_status(path);
            match status {
                PathStatus::Deleted if !flags.contains(OpenFlags::CREATE) => {
                    return Err(not_found(path));
                }
                // A stale secondary copy may have survived the removal
                PathStatus::Deleted => flags |= OpenFlags::TRUNCATE,
                PathStatus::Modified => {}
                PathStatus::Untouched if flags.contains(OpenFlags::TRUNCATE) => {
                    // Nothing worth copying; let the truncating open create it
                    match self.primary.stat(path) {
                        Ok(meta) if meta.is_file() => flags |= OpenFlags::CREATE,
                        Ok(_) => self.copy_up_path(path)?,
                        Err(_) => {}
                    }
                }
                PathStatus::Untouched => self.copy_up_path(path)?,
            }

            self.ensure_parents(path)?;
            let file = self.secondary.open_file(path, flags, perm)?;
            if status == PathStatus::Deleted {
                self.hide_primary_children(path);
            }
            self.state.mark_modified(path);
            Ok(file)
        })
    }

    /// Hide the primary's children of a directory being recreated after a
    /// removal, so the new directory starts empty.
    fn hide_primary_children(&self, dir: &str) {
        if !self.primary.stat(dir).is_ok_and(|meta| meta.is_dir()) {
            return;
        }
        match self.primary.read_dir(dir) {
            Ok(entries) => {
                for entry in entries {
                    self.state.mark_deleted(&path::join(dir, &entry.name));
                }
            }
            Err(e) if is_not_found(&e) => {}
            Err(e) => tracing::warn!("listing {} on primary failed: {}", dir, e),
        }
    }

    /// Empty a directory the secondary kept after a failed removal. Entries
    /// that cannot be removed stay hidden.
    fn purge_secondary_children(&self, dir: &str) {
        let entries = match self.secondary.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("listing {} on secondary failed: {}", dir, e);
                return;
            }
        };
        for entry in entries {
            let child = path::join(dir, &entry.name);
            if let Err(e) = remove_tree(self.secondary.as_ref(), &child) {
                tracing::warn!("purge of stale {} failed: {}", child, e);
                self.state.mark_deleted(&child);
            }
        }
    }

    /// Refuse rename targets the secondary cannot see: an untouched primary
    /// entry of the wrong kind, or a non-empty directory.
    fn check_rename_target(&self, new_path: &str, source_is_dir: bool) -> io::Result<()> {
        let target = match self.stat(new_path) {
            Ok(meta) => meta,
            Err(e) if is_not_found(&e) => return Ok(()),
            Err(e) => return Err(e),
        };
        match (target.is_dir(), source_is_dir) {
            (true, false) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", new_path),
            )),
            (false, true) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", new_path),
            )),
            (true, true) if !self.read_dir(new_path)?.is_empty() => Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("directory not empty: {}", new_path),
            )),
            _ => Ok(()),
        }
    }

    /// Record every entry under a renamed directory as living in the
    /// secondary.
    fn mark_tree_modified(&self, dir: &str) {
        let entries = match self.secondary.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("listing {} on secondary failed: {}", dir, e);
                return;
            }
        };
        for entry in entries {
            let child = path::join(dir, &entry.name);
            self.state.mark_modified(&child);
            if entry.is_dir() {
                self.mark_tree_modified(&child);
            }
        }
    }
}

/// Remove `path` and everything beneath it from `backend`.
fn remove_tree(backend: &dyn Backend, path: &str) -> io::Result<()> {
    if backend.stat(path)?.is_dir() {
        for entry in backend.read_dir(path)? {
            remove_tree(backend, &path::join(path, &entry.name))?;
        }
    }
    backend.remove(path)
}

impl Backend for CowFs {
    fn open_file(&self, path: &str, flags: OpenFlags, perm: u32) -> io::Result<Box<dyn File>> {
        let path = path::normalize(path);
        tracing::debug!("open_file(path={}, flags={:?}, perm={:#o})", path, flags, perm);

        if flags.is_write() {
            self.open_for_write(&path, flags, perm)
        } else {
            self.open_for_read(&path, flags)
        }
    }

    fn mkdir(&self, path: &str, perm: u32) -> io::Result<()> {
        let path = path::normalize(path);
        tracing::debug!("mkdir(path={}, perm={:#o})", path, perm);

        self.with_copy_up_lock(&path, || {
            let status = self.state.effective_status(&path);
            if status == PathStatus::Untouched && self.primary.exists(&path) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("already exists: {}", path),
                ));
            }
            let stale = self.state.status_of(&path) == PathStatus::Deleted
                && self.secondary.stat(&path).is_ok_and(|meta| meta.is_dir());
            if stale {
                self.purge_secondary_children(&path);
                self.secondary.chmod(&path, perm)?;
            } else {
                self.ensure_parents(&path)?;
                self.secondary.mkdir(&path, perm)?;
            }
            if status == PathStatus::Deleted {
                self.hide_primary_children(&path);
            }
            self.state.mark_modified(&path);
            Ok(())
        })
    }

    /// Removal always succeeds: the path is hidden from the overlay even if
    /// the secondary cannot drop its copy. The root is never hidden.
    fn remove(&self, path: &str) -> io::Result<()> {
        let path = path::normalize(path);
        tracing::debug!("remove(path={})", path);

        if path == ROOT {
            tracing::warn!("remove: ignoring request to remove the overlay root");
            return Ok(());
        }

        self.with_copy_up_lock(&path, || {
            self.state.mark_tree_deleted(&path);
            match remove_tree(self.secondary.as_ref(), &path) {
                Ok(()) => {}
                Err(e) if is_not_found(&e) => {
                    tracing::trace!("remove: {} not present in secondary", path)
                }
                Err(e) => tracing::warn!("remove: secondary removal of {} failed: {}", path, e),
            }
            Ok(())
        })
    }

    fn rename(&self, old_path: &str, new_path: &str) -> io::Result<()> {
        let old_path = path::normalize(old_path);
        let new_path = path::normalize(new_path);
        tracing::debug!("rename(old={}, new={})", old_path, new_path);

        self.with_copy_up_lock(&old_path, || {
            let is_dir = self.stat(&old_path)?.is_dir();
            if old_path == new_path {
                return Ok(());
            }
            self.check_rename_target(&new_path, is_dir)?;
            let target_deleted = self.state.effective_status(&new_path) == PathStatus::Deleted;

            if is_dir {
                self.copy_up_tree(&old_path)?;
            } else {
                self.copy_up_path(&old_path)?;
            }
            self.ensure_parents(&new_path)?;
            self.secondary.rename(&old_path, &new_path)?;

            self.state.mark_tree_deleted(&old_path);
            if target_deleted {
                self.hide_primary_children(&new_path);
            }
            self.state.mark_modified(&new_path);
            if is_dir {
                self.mark_tree_modified(&new_path);
            }
            Ok(())
        })
    }

    fn stat(&self, path: &str) -> io::Result<Metadata> {
        let path = path::normalize(path);
        tracing::debug!("stat(path={})", path);

        match self.state.effective_status(&path) {
            PathStatus::Deleted => Err(not_found(&path)),
            PathStatus::Modified => self.secondary.stat(&path),
            PathStatus::Untouched => self
                .primary
                .stat(&path)
                .or_else(|_| self.secondary.stat(&path)),
        }
    }

    fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        self.modify(path, "chmod", |secondary, path| secondary.chmod(path, mode))
    }

    fn chtimes(&self, path: &str, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        self.modify(path, "chtimes", |secondary, path| {
            secondary.chtimes(path, atime, mtime)
        })
    }

    fn chown(&self, path: &str, uid: u32, gid: u32) -> io::Result<()> {
        self.modify(path, "chown", |secondary, path| secondary.chown(path, uid, gid))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let path = path::normalize(path);
        tracing::debug!("read_dir(path={})", path);

        if self.state.effective_status(&path) == PathStatus::Deleted {
            return Err(not_found(&path));
        }
        self.merger().merge(&path)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let path = path::normalize(path);
        tracing::debug!("read_file(path={})", path);

        match self.state.effective_status(&path) {
            PathStatus::Deleted => Err(not_found(&path)),
            PathStatus::Modified => self.secondary.read_file(&path),
            PathStatus::Untouched => self
                .primary
                .read_file(&path)
                .or_else(|_| self.secondary.read_file(&path)),
        }
    }

    fn as_temp_dir(&self) -> Option<&dyn TempDir> {
        Some(self)
    }
}

impl TempDir for CowFs {
    /// The secondary's temp directory, or the configured fallback.
    fn temp_dir(&self) -> String {
        match self.secondary.as_temp_dir() {
            Some(temp) => temp.temp_dir(),
            None => self.config.get_temp_dir(),
        }
    }
}
