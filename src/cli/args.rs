use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cowfs")]
#[command(
    about = "Inspect a copy-on-write overlay of a read-only directory and a writable one"
)]
pub struct Args {
    #[arg(long, global = true, help = "Read-only base directory")]
    pub primary: Option<PathBuf>,

    #[arg(long, global = true, help = "Writable directory holding overlay changes")]
    pub secondary: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "List a directory through the overlay")]
    Ls {
        #[arg(default_value = "/", help = "Directory to list")]
        path: String,

        #[arg(long, help = "Machine-readable output (tab-separated values)")]
        porcelain: bool,

        #[arg(long, help = "JSON output")]
        json: bool,
    },
    #[command(about = "Print a file through the overlay")]
    Cat {
        #[arg(help = "File to print")]
        path: String,
    },
    #[command(about = "Show metadata for a path through the overlay")]
    Stat {
        #[arg(help = "Path to inspect")]
        path: String,

        #[arg(long, help = "JSON output")]
        json: bool,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    #[command(about = "Show current configuration values")]
    Show,
    #[command(about = "Show config file path")]
    Path,
}
