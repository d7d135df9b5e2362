use cowfs::{Backend, CowFs, MemFs, OpenFlags};
use std::io::{Read, Write};
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

/// Get the path to the cowfs binary for testing.
#[allow(dead_code)]
pub fn get_cowfs_path() -> PathBuf {
    assert_cmd::cargo::cargo_bin!("cowfs").to_path_buf()
}

/// An overlay over two in-memory backends, keeping handles to both so tests
/// can check what landed where.
#[allow(dead_code)]
pub struct MemOverlay {
    pub primary: Arc<MemFs>,
    pub secondary: Arc<MemFs>,
    pub fs: CowFs,
}

impl Default for MemOverlay {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl MemOverlay {
    pub fn new() -> Self {
        let primary = Arc::new(MemFs::new());
        let secondary = Arc::new(MemFs::new());
        let fs = CowFs::new(primary.clone(), secondary.clone());
        Self {
            primary,
            secondary,
            fs,
        }
    }

    /// Seed the primary with `(path, content)` pairs.
    pub fn with_primary_files(files: &[(&str, &str)]) -> Self {
        let overlay = Self::new();
        for (path, content) in files {
            overlay
                .primary
                .write_file(path, content.as_bytes(), 0o644)
                .expect("Failed to seed primary");
        }
        overlay
    }
}

#[allow(dead_code)]
pub fn read_string(fs: &dyn Backend, path: &str) -> String {
    let mut file = fs
        .open_file(path, OpenFlags::READ_ONLY, 0)
        .unwrap_or_else(|e| panic!("Failed to open {}: {}", path, e));
    let mut content = String::new();
    file.read_to_string(&mut content)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    content
}

#[allow(dead_code)]
pub fn write_string(fs: &dyn Backend, path: &str, content: &str, flags: OpenFlags) {
    let mut file = fs
        .open_file(path, flags, 0o644)
        .unwrap_or_else(|e| panic!("Failed to open {} for writing: {}", path, e));
    file.write_all(content.as_bytes())
        .unwrap_or_else(|e| panic!("Failed to write {}: {}", path, e));
}

#[allow(dead_code)]
pub fn list_names(fs: &dyn Backend, dir: &str) -> Vec<String> {
    fs.read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to list {}: {}", dir, e))
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

#[allow(dead_code)]
static CONFIG_ENV_LOCK: Mutex<()> = Mutex::new(());

/// Points `COWFS_CONFIG_DIR` at a fresh temp dir for the lifetime of the
/// context. Contexts in one test binary are serialized on a shared lock.
#[allow(dead_code)]
pub struct TestConfigContext {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
    _guard: MutexGuard<'static, ()>,
}

impl Default for TestConfigContext {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestConfigContext {
    pub fn new() -> Self {
        let guard = CONFIG_ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("config");

        env::set_var("COWFS_CONFIG_DIR", config_dir.to_string_lossy().to_string());

        Self {
            temp_dir,
            config_dir,
            _guard: guard,
        }
    }
}

impl Drop for TestConfigContext {
    fn drop(&mut self) {
        env::remove_var("COWFS_CONFIG_DIR");
    }
}
