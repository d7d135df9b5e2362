use cowfs::error::{CowfsError, Result};
use std::path::{Path, PathBuf};

fn require_dir(flag: &str, dir: Option<&Path>) -> Result<PathBuf> {
    let dir = dir.ok_or_else(|| CowfsError::Config(format!("--{} is required", flag)))?;

    if !dir.is_dir() {
        return Err(CowfsError::InvalidPath(dir.to_path_buf()));
    }

    Ok(dir.to_path_buf())
}

/// Check the `--primary` / `--secondary` pair before building backends on it.
pub fn validate_backend_dirs(
    primary: Option<&Path>,
    secondary: Option<&Path>,
) -> Result<(PathBuf, PathBuf)> {
    let primary = require_dir("primary", primary)?;
    let secondary = require_dir("secondary", secondary)?;

    let same = match (primary.canonicalize(), secondary.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => primary == secondary,
    };
    if same {
        return Err(CowfsError::Config(
            "--primary and --secondary must be different directories".to_string(),
        ));
    }

    Ok((primary, secondary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flag() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_backend_dirs(None, Some(dir.path())).unwrap_err();
        assert!(err.to_string().contains("--primary"));
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let err = validate_backend_dirs(Some(&file), Some(dir.path())).unwrap_err();
        assert!(matches!(err, CowfsError::InvalidPath(_)));
    }

    #[test]
    fn test_same_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_backend_dirs(Some(dir.path()), Some(dir.path())).is_err());
    }

    #[test]
    fn test_valid_pair() {
        let primary = tempfile::tempdir().unwrap();
        let secondary = tempfile::tempdir().unwrap();
        let (p, s) = validate_backend_dirs(Some(primary.path()), Some(secondary.path())).unwrap();
        assert_eq!(p, primary.path());
        assert_eq!(s, secondary.path());
    }
}
