//! Security error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("path escapes base directory: {path} is not within {base}")]
    PathTraversal { path: PathBuf, base: PathBuf },

    #[error("not found or not a regular file: {0}")]
    NotFound(PathBuf),

    #[error("refusing to follow symlink: {0}")]
    Symlink(PathBuf),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SecurityError {
    pub fn is_traversal(&self) -> bool {
        matches!(
            self,
            SecurityError::PathTraversal { .. } | SecurityError::Symlink(_)
        )
    }
}
