use cowfs::config::{get_config_path, load_config};
use cowfs::error::Result;

use crate::cli::ConfigAction;

pub fn handle_config_command(action: Option<ConfigAction>) -> Result<()> {
    match action {
        Some(ConfigAction::Path) => {
            let config_path = get_config_path()?;
            println!("Config location: {}", config_path.display());
        }
        None | Some(ConfigAction::Show) => {
            let config_path = get_config_path()?;
            let config = load_config()?;
            println!("Config file: {}", config_path.display());
            if !config_path.exists() {
                println!("  (not present, using defaults)");
            }
            println!();
            println!("Current configuration:");
            println!("  Overlay:");
            println!(
                "    default_file_mode: {:04o}",
                config.overlay.get_default_file_mode()
            );
            println!(
                "    default_dir_mode: {:04o}",
                config.overlay.get_default_dir_mode()
            );
            println!("    temp_dir: {}", config.overlay.get_temp_dir());
            println!("  Log:");
            println!("    filter: {}", config.log.get_filter());
        }
    }
    Ok(())
}
