use cowfs::config::load_config;
use cowfs::error::Result;
use cowfs::{CowFs, OsFs};
use std::path::Path;
use std::sync::Arc;

use crate::cli::validate_backend_dirs;

/// Build the overlay the inspection commands read through.
pub fn open_overlay(primary: Option<&Path>, secondary: Option<&Path>) -> Result<CowFs> {
    let (primary, secondary) = validate_backend_dirs(primary, secondary)?;
    let config = load_config()?;

    tracing::debug!(
        "overlay: primary={}, secondary={}",
        primary.display(),
        secondary.display()
    );

    Ok(CowFs::with_config(
        Arc::new(OsFs::new(primary)),
        Arc::new(OsFs::new(secondary)),
        &config.overlay,
    ))
}
