//! Directory listing merge across both backends.

use fxhash::{FxHashMap, FxHashSet};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::backend::{paginate, Backend, DirEntry, File, Metadata};
use crate::error::is_not_found;
use crate::overlay::state::{OverlayState, PathStatus};
use crate::path;

/// Combines a directory's primary and secondary listings into the view the
/// overlay presents.
#[derive(Clone)]
pub struct DirectoryMerger {
    primary: Arc<dyn Backend>,
    secondary: Arc<dyn Backend>,
    state: Arc<OverlayState>,
}

impl DirectoryMerger {
    pub fn new(
        primary: Arc<dyn Backend>,
        secondary: Arc<dyn Backend>,
        state: Arc<OverlayState>,
    ) -> Self {
        DirectoryMerger {
            primary,
            secondary,
            state,
        }
    }

    /// Merged listing of `dir`.
    ///
    /// Primary entries come first in the primary's order, followed by
    /// secondary entries whose names the primary did not list. Entries
    /// removed through the overlay are dropped. A primary entry that has
    /// been modified reports the secondary's metadata. If neither backend
    /// can list `dir` the primary's error is returned.
    pub fn merge(&self, dir: &str) -> io::Result<Vec<DirEntry>> {
        let dir = path::normalize(dir);
        let (primary, secondary) = match (self.primary.read_dir(&dir), self.secondary.read_dir(&dir)) {
            (Err(e), Err(_)) => return Err(e),
            (primary, secondary) => (
                listing_or_empty(primary, "primary", &dir),
                listing_or_empty(secondary, "secondary", &dir),
            ),
        };

        let mut upper: FxHashMap<String, Metadata> = secondary
            .iter()
            .map(|entry| (entry.name.clone(), entry.metadata.clone()))
            .collect();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut merged = Vec::with_capacity(primary.len() + secondary.len());

        for mut entry in primary {
            if is_dot(&entry.name) {
                continue;
            }
            match self.state.status_of(&path::join(&dir, &entry.name)) {
                PathStatus::Deleted => continue,
                PathStatus::Modified => {
                    if let Some(metadata) = upper.remove(&entry.name) {
                        entry.metadata = metadata;
                    }
                }
                PathStatus::Untouched => {}
            }
            seen.insert(entry.name.clone());
            merged.push(entry);
        }

        for entry in secondary {
            if is_dot(&entry.name) || seen.contains(&entry.name) {
                continue;
            }
            if self.state.status_of(&path::join(&dir, &entry.name)) == PathStatus::Deleted {
                continue;
            }
            merged.push(entry);
        }

        tracing::trace!("merged listing of {}: {} entries", dir, merged.len());
        Ok(merged)
    }
}

fn is_dot(name: &str) -> bool {
    name == "." || name == ".."
}

fn listing_or_empty(listing: io::Result<Vec<DirEntry>>, side: &str, dir: &str) -> Vec<DirEntry> {
    match listing {
        Ok(entries) => entries,
        Err(e) => {
            if !is_not_found(&e) {
                tracing::warn!("listing {} on {} failed: {}", dir, side, e);
            }
            Vec::new()
        }
    }
}

/// Directory handle whose listing is the merged view.
///
/// The listing is built on the first directory read and cached for the
/// lifetime of the handle. Everything else is forwarded to the wrapped
/// handle.
pub struct MergedDir {
    inner: Box<dyn File>,
    merger: DirectoryMerger,
    path: String,
    merged: Option<Vec<DirEntry>>,
    offset: usize,
}

impl MergedDir {
    pub fn new(inner: Box<dyn File>, merger: DirectoryMerger, path: &str) -> Self {
        MergedDir {
            inner,
            merger,
            path: path::normalize(path),
            merged: None,
            offset: 0,
        }
    }
}

impl Read for MergedDir {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for MergedDir {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for MergedDir {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.inner.seek(pos)?;
        if matches!(pos, SeekFrom::Start(0)) {
            self.offset = 0;
        }
        Ok(position)
    }
}

impl File for MergedDir {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn stat(&self) -> io::Result<Metadata> {
        self.inner.stat()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.inner.sync()
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.inner.read_at(buf, offset)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.inner.write_at(buf, offset)
    }

    fn truncate(&mut self, size: u64) -> io::Result<()> {
        self.inner.truncate(size)
    }

    fn read_dir_entries(&mut self, n: usize) -> io::Result<Vec<DirEntry>> {
        if self.merged.is_none() {
            self.merged = Some(self.merger.merge(&self.path)?);
        }
        match &self.merged {
            Some(entries) => Ok(paginate(entries, &mut self.offset, n)),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}
