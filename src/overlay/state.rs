use crate::path;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde::Serialize;

/// Overlay bookkeeping for a single path.
///
/// A path with no entry is `Untouched` and still served from the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStatus {
    Untouched,
    Modified,
    Deleted,
}

/// Per-path status map shared by every overlay operation.
///
/// Queries take the shared lock, mutations the exclusive one. The lock is
/// only held for the map access itself, never across backend I/O.
#[derive(Debug, Default)]
pub struct OverlayState {
    entries: RwLock<FxHashMap<String, PathStatus>>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` now lives in the secondary. Clears a deletion.
    pub fn mark_modified(&self, path: &str) {
        let path = path::normalize(path);
        tracing::trace!("state: {} -> modified", path);
        self.entries.write().insert(path, PathStatus::Modified);
    }

    /// Hide `path` from both backends. Clears a modification.
    pub fn mark_deleted(&self, path: &str) {
        let path = path::normalize(path);
        tracing::trace!("state: {} -> deleted", path);
        self.entries.write().insert(path, PathStatus::Deleted);
    }

    /// Mark `path` deleted along with every tracked path beneath it.
    pub fn mark_tree_deleted(&self, path: &str) {
        let path = path::normalize(path);
        tracing::trace!("state: {} and descendants -> deleted", path);
        let mut entries = self.entries.write();
        for (key, status) in entries.iter_mut() {
            if path::is_within(key, &path) {
                *status = PathStatus::Deleted;
            }
        }
        entries.insert(path, PathStatus::Deleted);
    }

    /// Drop a deletion marker so `path` falls through to the primary again.
    /// Modified entries are left alone.
    pub fn clear_deleted(&self, path: &str) {
        let path = path::normalize(path);
        let mut entries = self.entries.write();
        if entries.get(&path) == Some(&PathStatus::Deleted) {
            tracing::trace!("state: {} -> untouched", path);
            entries.remove(&path);
        }
    }

    /// Status recorded for exactly this path.
    pub fn status_of(&self, path: &str) -> PathStatus {
        let path = path::normalize(path);
        self.entries
            .read()
            .get(&path)
            .copied()
            .unwrap_or(PathStatus::Untouched)
    }

    /// Status as seen through the overlay.
    ///
    /// An untracked path inherits `Deleted` from its nearest tracked
    /// ancestor, so the contents of a removed directory disappear with it.
    pub fn effective_status(&self, path: &str) -> PathStatus {
        let path = path::normalize(path);
        let entries = self.entries.read();
        if let Some(status) = entries.get(&path) {
            return *status;
        }
        for ancestor in path::ancestors(&path).iter().rev() {
            match entries.get(ancestor) {
                Some(PathStatus::Deleted) => return PathStatus::Deleted,
                Some(_) => return PathStatus::Untouched,
                None => {}
            }
        }
        PathStatus::Untouched
    }

    /// Sorted copy of every tracked entry.
    pub fn snapshot(&self) -> Vec<(String, PathStatus)> {
        let mut changes: Vec<(String, PathStatus)> = self
            .entries
            .read()
            .iter()
            .map(|(path, status)| (path.clone(), *status))
            .collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        changes
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_untracked_is_untouched() {
        let state = OverlayState::new();
        assert_eq!(state.status_of("/anything"), PathStatus::Untouched);
        assert!(state.is_empty());
    }

    #[test]
    fn test_modified_and_deleted_are_exclusive() {
        let state = OverlayState::new();

        state.mark_modified("/a.txt");
        assert_eq!(state.status_of("/a.txt"), PathStatus::Modified);

        state.mark_deleted("/a.txt");
        assert_eq!(state.status_of("/a.txt"), PathStatus::Deleted);

        state.mark_modified("/a.txt");
        assert_eq!(state.status_of("/a.txt"), PathStatus::Modified);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_clear_deleted_leaves_modified() {
        let state = OverlayState::new();
        state.mark_deleted("/gone.txt");
        state.mark_modified("/kept.txt");

        state.clear_deleted("/gone.txt");
        state.clear_deleted("/kept.txt");

        assert_eq!(state.status_of("/gone.txt"), PathStatus::Untouched);
        assert_eq!(state.status_of("/kept.txt"), PathStatus::Modified);
    }

    #[test]
    fn test_paths_are_normalized() {
        let state = OverlayState::new();
        state.mark_modified("dir//file.txt/");
        assert_eq!(state.status_of("/dir/file.txt"), PathStatus::Modified);
    }

    #[test]
    fn test_effective_status_inherits_deletion() {
        let state = OverlayState::new();
        state.mark_deleted("/dir");

        assert_eq!(state.status_of("/dir/file.txt"), PathStatus::Untouched);
        assert_eq!(state.effective_status("/dir/file.txt"), PathStatus::Deleted);
        assert_eq!(state.effective_status("/dir/sub/deep.txt"), PathStatus::Deleted);
        assert_eq!(state.effective_status("/other.txt"), PathStatus::Untouched);

        state.mark_modified("/dir/new.txt");
        assert_eq!(state.effective_status("/dir/new.txt"), PathStatus::Modified);

        // A recreated directory stops hiding its children
        state.mark_modified("/dir");
        assert_eq!(state.effective_status("/dir/file.txt"), PathStatus::Untouched);
    }

    #[test]
    fn test_mark_tree_deleted() {
        let state = OverlayState::new();
        state.mark_modified("/dir/a.txt");
        state.mark_modified("/dir/sub/b.txt");
        state.mark_modified("/dirty.txt");

        state.mark_tree_deleted("/dir");

        assert_eq!(state.status_of("/dir"), PathStatus::Deleted);
        assert_eq!(state.status_of("/dir/a.txt"), PathStatus::Deleted);
        assert_eq!(state.status_of("/dir/sub/b.txt"), PathStatus::Deleted);
        assert_eq!(state.status_of("/dirty.txt"), PathStatus::Modified);
    }

    #[test]
    fn test_snapshot_sorted() {
        let state = OverlayState::new();
        state.mark_modified("/b");
        state.mark_deleted("/a");
        state.mark_modified("/c");

        let snapshot = state.snapshot();
        assert_eq!(
            snapshot,
            vec![
                ("/a".to_string(), PathStatus::Deleted),
                ("/b".to_string(), PathStatus::Modified),
                ("/c".to_string(), PathStatus::Modified),
            ]
        );
    }

    #[test]
    fn test_concurrent_marks() {
        let state = Arc::new(OverlayState::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..100 {
                        let path = format!("/t{}/f{}", t, i);
                        state.mark_modified(&path);
                        assert_eq!(state.status_of(&path), PathStatus::Modified);
                        if i % 2 == 0 {
                            state.mark_deleted(&path);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(state.len(), 800);
        let deleted = state
            .snapshot()
            .into_iter()
            .filter(|(_, status)| *status == PathStatus::Deleted)
            .count();
        assert_eq!(deleted, 400);
    }
}
