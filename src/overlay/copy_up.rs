//! Lazy copy of primary content into the secondary.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

use crate::backend::{Backend, OpenFlags};
use crate::error::{is_not_found, not_found};
use crate::overlay::state::PathStatus;
use crate::overlay::CowFs;
use crate::path;

/// Copy `path` from `primary` into `secondary`.
///
/// Returns `Ok(false)` when the primary does not hold `path`. A file is
/// streamed into a truncated secondary file carrying the primary's permission
/// bits (`default_perm` when those cannot be read); a directory is created
/// empty. Parent directories must already exist in the secondary.
pub fn copy_up(
    primary: &dyn Backend,
    secondary: &dyn Backend,
    path: &str,
    default_perm: u32,
) -> io::Result<bool> {
    let mut source = match primary.open_file(path, OpenFlags::READ_ONLY, 0) {
        Ok(file) => file,
        Err(e) if is_not_found(&e) => return Ok(false),
        Err(e) => return Err(e),
    };

    let (is_dir, perm) = match source.stat() {
        Ok(meta) => (meta.is_dir(), meta.permissions()),
        Err(e) => {
            tracing::warn!("copy-up: stat of {} failed, using default mode: {}", path, e);
            (false, default_perm)
        }
    };

    if is_dir {
        match secondary.stat(path) {
            Ok(meta) if meta.is_dir() => {}
            _ => secondary.mkdir(path, perm)?,
        }
        tracing::debug!("copy-up: created directory {}", path);
        return Ok(true);
    }

    let mut dest = secondary.open_file(
        path,
        OpenFlags::WRITE_ONLY | OpenFlags::CREATE | OpenFlags::TRUNCATE,
        perm,
    )?;
    let copied = io::copy(&mut source, &mut dest)?;
    dest.sync()?;
    tracing::debug!("copy-up: {} ({} bytes)", path, copied);
    Ok(true)
}

impl CowFs {
    /// Run `f` while holding the copy-up lock for `path`.
    ///
    /// Operations on the same path are serialized; unrelated paths proceed in
    /// parallel. The lock entry is dropped once no other thread holds a
    /// reference to it.
    pub(crate) fn with_copy_up_lock<T, F>(&self, path: &str, f: F) -> io::Result<T>
    where
        F: FnOnce() -> io::Result<T>,
    {
        let lock = {
            let mut locks = self.copy_up_locks.write();
            locks
                .entry(path.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _guard = lock.lock();
            f()
        };

        let mut locks = self.copy_up_locks.write();
        drop(lock);
        // Only the map still holds it: nobody else is waiting
        if locks
            .get(path)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(path);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn copy_up_locks_count(&self) -> usize {
        self.copy_up_locks.read().len()
    }

    /// Create the ancestors of `path` that the secondary is missing.
    ///
    /// Directories take the primary's permission bits. Fails with `NotFound`
    /// when an ancestor has been removed through the overlay. An ancestor
    /// that neither backend holds is left for the caller's secondary
    /// operation to report.
    pub(crate) fn ensure_parents(&self, path: &str) -> io::Result<()> {
        for dir in path::ancestors(path) {
            if self.state.effective_status(&dir) == PathStatus::Deleted {
                return Err(not_found(&dir));
            }
            if self.secondary.stat(&dir).is_ok_and(|meta| meta.is_dir()) {
                continue;
            }
            let perm = match self.primary.stat(&dir) {
                Ok(meta) if meta.is_dir() => meta.permissions(),
                Ok(_) => return Ok(()),
                Err(e) if is_not_found(&e) => return Ok(()),
                Err(e) => {
                    tracing::warn!("stat of {} on primary failed: {}", dir, e);
                    self.config.get_default_dir_mode()
                }
            };
            match self.secondary.mkdir(&dir, perm) {
                Ok(()) => tracing::trace!("created parent directory {}", dir),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Copy `path` up unless it already lives in the secondary.
    ///
    /// Callers hold the copy-up lock for `path`.
    pub(crate) fn copy_up_path(&self, path: &str) -> io::Result<()> {
        if self.state.status_of(path) == PathStatus::Modified {
            return Ok(());
        }
        self.ensure_parents(path)?;
        copy_up(
            self.primary.as_ref(),
            self.secondary.as_ref(),
            path,
            self.config.get_default_file_mode(),
        )?;
        Ok(())
    }

    /// Copy a whole directory subtree into the secondary ahead of a rename.
    ///
    /// Descendants removed through the overlay are skipped, as are files the
    /// secondary already owns.
    pub(crate) fn copy_up_tree(&self, dir: &str) -> io::Result<()> {
        self.ensure_parents(dir)?;
        copy_up(
            self.primary.as_ref(),
            self.secondary.as_ref(),
            dir,
            self.config.get_default_dir_mode(),
        )?;

        let entries = match self.primary.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if is_not_found(&e) => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let child = path::join(dir, &entry.name);
            match self.state.status_of(&child) {
                PathStatus::Deleted => continue,
                _ if entry.is_dir() => self.copy_up_tree(&child)?,
                PathStatus::Modified => continue,
                PathStatus::Untouched => self.with_copy_up_lock(&child, || {
                    copy_up(
                        self.primary.as_ref(),
                        self.secondary.as_ref(),
                        &child,
                        self.config.get_default_file_mode(),
                    )
                    .map(|_| ())
                })?,
            }
        }
        Ok(())
    }
}
