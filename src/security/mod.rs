//! Trust boundary for every file the pipeline reads or writes.
//!
//! - Canonical path resolution with containment against a base directory
//! - Symlink escapes caught by resolving before comparing, and writes opened
//!   with `O_NOFOLLOW` relative to the root directory
//! - `..` smuggled through joined parts rejected after the join
//! - Soft checks (`is_dir`, `is_file`, `glob`) that degrade to "absent"

pub mod fs;
pub mod path;

mod error;

pub use error::SecurityError;
pub use fs::SecureFs;
pub use path::{resolve, safe_join};

use std::path::Path;

/// Read a regular file after validating it against `base`.
pub fn read(path: &Path, base: Option<&Path>) -> Result<String, SecurityError> {
    let root = match base {
        Some(base) => base.to_path_buf(),
        None => std::env::current_dir()?,
    };
    SecureFs::new(root)?.read_to_string(path)
}

/// Directory check that never fails: violations and errors read as `false`.
pub fn dir_exists(path: &Path, base: Option<&Path>) -> bool {
    resolve(path, base).map(|p| p.is_dir()).unwrap_or(false)
}

/// Glob lookup that never fails: violations and errors read as no matches.
pub fn glob_soft(pattern: &str, base: &Path) -> Vec<std::path::PathBuf> {
    SecureFs::new(base)
        .map(|fs| fs.glob(pattern))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_within_and_outside() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("ok.md"), "ok").unwrap();
        std::fs::write(dir.path().join("nope.md"), "nope").unwrap();

        assert_eq!(read(&base.join("ok.md"), Some(&base)).unwrap(), "ok");
        assert!(read(&dir.path().join("nope.md"), Some(&base))
            .unwrap_err()
            .is_traversal());
        assert!(matches!(
            read(&base.join("missing.md"), Some(&base)),
            Err(SecurityError::NotFound(_))
        ));
    }

    #[test]
    fn test_dir_exists_soft() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base");
        std::fs::create_dir_all(base.join("sub")).unwrap();

        assert!(dir_exists(&base.join("sub"), Some(&base)));
        assert!(dir_exists(&base, Some(&base)));
        assert!(!dir_exists(dir.path(), Some(&base)));
        assert!(!dir_exists(&base.join("missing"), Some(&base)));
    }

    #[test]
    fn test_glob_soft_missing_base() {
        let dir = tempdir().unwrap();
        assert!(glob_soft("*.md", &dir.path().join("missing")).is_empty());
    }
}
