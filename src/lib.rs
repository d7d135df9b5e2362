pub mod backend;
pub mod config;
pub mod error;
pub mod overlay;
pub mod path;

pub use backend::{Backend, DirEntry, File, FileKind, MemFs, Metadata, OpenFlags, TempDir};
#[cfg(unix)]
pub use backend::OsFs;

pub use config::get_config_path;
pub use config::load_config;
pub use config::save_config;
pub use config::Config;
pub use config::OverlayConfig;

pub use error::{CowfsError, Result};

pub use overlay::{
    copy_up, CowFs, DirectoryMerger, MergedDir, OverlayState, PathStatus, SubFs,
};
