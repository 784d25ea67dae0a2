//! Path containment checks.
//!
//! Every plugin-origin path is canonicalised (symlinks followed, `.`/`..`
//! folded) and must land on or below a base directory before it is touched.
//! Paths that do not exist yet are resolved through their deepest existing
//! ancestor so write targets get the same treatment as read sources.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::security::SecurityError;

pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::RootDir) | Some(Component::Prefix(_))
                    )
                {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Canonicalise `path`, tolerating a missing tail.
pub(crate) fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let normalized = normalize_path(path);
    let mut existing = normalized.as_path();
    let mut tail = Vec::new();

    loop {
        match std::fs::canonicalize(existing) {
            Ok(canonical) => {
                return Ok(tail
                    .iter()
                    .rev()
                    .fold(canonical, |acc: PathBuf, name| acc.join(name)));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(e);
                };
                tail.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            Err(e) => return Err(e),
        }
    }
}

fn validate_input(path: &Path) -> Result<(), SecurityError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(SecurityError::InvalidPath("empty path".into()));
    }
    if raw.as_encoded_bytes().contains(&0) {
        return Err(SecurityError::InvalidPath("null byte in path".into()));
    }
    Ok(())
}

pub(crate) fn canonical_base(base: Option<&Path>) -> Result<PathBuf, SecurityError> {
    match base {
        Some(base) => {
            validate_input(base)?;
            Ok(canonicalize_lenient(base)?)
        }
        None => Ok(canonicalize_lenient(&std::env::current_dir()?)?),
    }
}

/// Resolve `path` and require it to be `base` itself or a descendant of it.
///
/// Relative paths are interpreted against `base`. When `base` is `None` the
/// process working directory is used.
pub fn resolve(path: &Path, base: Option<&Path>) -> Result<PathBuf, SecurityError> {
    validate_input(path)?;
    let base = canonical_base(base)?;
    resolve_within(path, &base)
}

/// Same as [`resolve`] with an already-canonical base.
pub(crate) fn resolve_within(path: &Path, base: &Path) -> Result<PathBuf, SecurityError> {
    validate_input(path)?;
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let resolved = canonicalize_lenient(&joined)?;
    if !resolved.starts_with(base) {
        return Err(SecurityError::PathTraversal {
            path: resolved,
            base: base.to_path_buf(),
        });
    }
    Ok(resolved)
}

/// Join `parts` onto `base`, then re-validate the result.
///
/// Rejects joins that escape `base`, including `..` carried inside a part
/// and absolute parts that replace the prefix.
pub fn safe_join<P: AsRef<Path>>(base: &Path, parts: &[P]) -> Result<PathBuf, SecurityError> {
    let mut joined = base.to_path_buf();
    for part in parts {
        let part = part.as_ref();
        validate_input(part)?;
        joined.push(part);
    }
    resolve(&joined, Some(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_path(Path::new("/a/./b")), PathBuf::from("/a/b"));
        assert_eq!(
            normalize_path(Path::new("/a/b/../../c")),
            PathBuf::from("/c")
        );
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_resolve_base_itself() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(resolve(&root, Some(&root)).unwrap(), root);
    }

    #[test]
    fn test_resolve_descendant_existing_and_missing() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/file.txt"), "x").unwrap();

        assert_eq!(
            resolve(Path::new("a/file.txt"), Some(&root)).unwrap(),
            root.join("a/file.txt")
        );
        assert_eq!(
            resolve(Path::new("a/new/deeper.txt"), Some(&root)).unwrap(),
            root.join("a/new/deeper.txt")
        );
    }

    #[test]
    fn test_resolve_rejects_parent_escape() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let inner = root.join("inner");
        fs::create_dir_all(&inner).unwrap();

        let err = resolve(Path::new("../outside.txt"), Some(&inner)).unwrap_err();
        assert!(err.is_traversal());

        let err = resolve(Path::new("/etc/passwd"), Some(&inner)).unwrap_err();
        assert!(err.is_traversal());
    }

    #[test]
    fn test_resolve_rejects_sibling_with_common_prefix() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join("plugin")).unwrap();
        fs::create_dir_all(root.join("plugin-evil")).unwrap();

        let err = resolve(&root.join("plugin-evil/x"), Some(&root.join("plugin"))).unwrap_err();
        assert!(err.is_traversal());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlink_out_of_base() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let base = root.join("base");
        let outside = root.join("outside");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("secret.txt"), "s").unwrap();
        std::os::unix::fs::symlink(&outside, base.join("link")).unwrap();

        let err = resolve(Path::new("link/secret.txt"), Some(&base)).unwrap_err();
        assert!(err.is_traversal());
    }

    #[test]
    fn test_safe_join_rejects_smuggled_parent() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();

        assert_eq!(
            safe_join(&root, &["scripts", "run.sh"]).unwrap(),
            root.join("scripts/run.sh")
        );
        assert!(safe_join(&root, &["scripts/../../x"]).unwrap_err().is_traversal());
        assert!(safe_join(&root, &["/tmp"]).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            resolve(Path::new(""), Some(dir.path())),
            Err(SecurityError::InvalidPath(_))
        ));
        assert!(matches!(
            resolve(Path::new("a\0b"), Some(dir.path())),
            Err(SecurityError::InvalidPath(_))
        ));
    }
}
