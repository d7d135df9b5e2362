use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CowfsError>;

#[derive(Error, Debug)]
pub enum CowfsError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for CowfsError {
    fn from(err: serde_json::Error) -> Self {
        CowfsError::Json(err.to_string())
    }
}

impl From<CowfsError> for io::Error {
    fn from(err: CowfsError) -> Self {
        match err {
            CowfsError::Io(e) => e,
            CowfsError::NotFound(path) => not_found(&path),
            CowfsError::InvalidPath(path) => io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid path: {}", path.display()),
            ),
            other => io::Error::other(other.to_string()),
        }
    }
}

/// The error every overlay read path returns for a deleted or missing path.
pub fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {}", path))
}

pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kind() {
        let err = not_found("/missing.txt");
        assert!(is_not_found(&err));
        assert!(err.to_string().contains("/missing.txt"));
    }

    #[test]
    fn test_io_error_passes_through_unchanged() {
        let original = io::Error::new(io::ErrorKind::PermissionDenied, "denied by backend");
        let err: io::Error = CowfsError::Io(original).into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "denied by backend");
    }

    #[test]
    fn test_config_error_becomes_other() {
        let err: io::Error = CowfsError::Config("bad mode".to_string()).into();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(err.to_string().contains("bad mode"));
    }
}
