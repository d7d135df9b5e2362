pub mod paths;
pub mod persistence;
pub mod schema;

pub use paths::*;
pub use persistence::*;
pub use schema::*;

fn default_file_mode() -> u32 {
    0o644
}

fn default_dir_mode() -> u32 {
    0o755
}

fn default_temp_dir() -> String {
    "/tmp".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}
