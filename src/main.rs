use clap::Parser;

mod cli;
mod commands;

use cli::{Args, Commands};
use cowfs::config::load_config;
use cowfs::error;

fn main() {
    match run() {
        Ok(code) => {
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> error::Result<i32> {
    let args = Args::parse();

    let default_filter = load_config()
        .map(|config| config.log.get_filter())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("COWFS_LOG").unwrap_or(default_filter))
        .with_writer(std::io::stderr)
        .init();

    let primary = args.primary.as_deref();
    let secondary = args.secondary.as_deref();

    match args.command {
        Commands::Ls {
            path,
            porcelain,
            json,
        } => {
            let fs = commands::open_overlay(primary, secondary)?;
            commands::list_directory(&fs, &path, porcelain, json)?;
            Ok(0)
        }
        Commands::Cat { path } => {
            let fs = commands::open_overlay(primary, secondary)?;
            commands::print_file(&fs, &path)?;
            Ok(0)
        }
        Commands::Stat { path, json } => {
            let fs = commands::open_overlay(primary, secondary)?;
            commands::print_stat(&fs, &path, json)?;
            Ok(0)
        }
        Commands::Config { action } => {
            commands::handle_config_command(action)?;
            Ok(0)
        }
    }
}
