pub mod cat;
pub mod config;
pub mod ls;
pub mod overlay;
pub mod stat;

pub use cat::print_file;
pub use config::handle_config_command;
pub use ls::list_directory;
pub use overlay::open_overlay;
pub use stat::print_stat;

use chrono::{DateTime, Local};
use std::time::SystemTime;

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn format_time_rfc3339(time: SystemTime) -> String {
    DateTime::<Local>::from(time).to_rfc3339()
}
