//! Descriptor-relative file access that never follows a symlink.
//!
//! A target is walked one component at a time from an open root directory
//! with `O_NOFOLLOW`, so a link planted anywhere below the root, dangling or
//! not, stops the operation instead of redirecting it.

use std::ffi::{CString, OsStr, OsString};
use std::fs::File;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use rustix::fs::{AtFlags, Mode, OFlags, mkdirat, openat, renameat, unlinkat};
use rustix::io::Errno;
use uuid::Uuid;

use crate::security::SecurityError;

const DIR_FLAGS: OFlags = OFlags::RDONLY
    .union(OFlags::DIRECTORY)
    .union(OFlags::NOFOLLOW)
    .union(OFlags::CLOEXEC);

fn c_string(name: impl AsRef<OsStr>) -> Result<CString, SecurityError> {
    CString::new(name.as_ref().as_bytes())
        .map_err(|_| SecurityError::InvalidPath("null byte in path".into()))
}

fn os_error(path: PathBuf, errno: Errno) -> SecurityError {
    let is_link = std::fs::symlink_metadata(&path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if errno == Errno::LOOP || (errno == Errno::NOTDIR && is_link) {
        return SecurityError::Symlink(path);
    }
    SecurityError::Io(std::io::Error::from_raw_os_error(errno.raw_os_error()))
}

/// A validated path held as components below an open root directory.
#[derive(Debug)]
pub(crate) struct AnchoredPath {
    root: PathBuf,
    components: Vec<OsString>,
}

impl AnchoredPath {
    /// `resolved` must already be canonical and inside `root`.
    pub(crate) fn new(root: &Path, resolved: &Path) -> Result<Self, SecurityError> {
        let relative = resolved
            .strip_prefix(root)
            .map_err(|_| SecurityError::PathTraversal {
                path: resolved.to_path_buf(),
                base: root.to_path_buf(),
            })?;
        let components = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_os_string()),
                _ => None,
            })
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            components,
        })
    }

    fn prefix(&self, len: usize) -> PathBuf {
        self.components[..len]
            .iter()
            .fold(self.root.clone(), |acc, c| acc.join(c))
    }

    fn full(&self) -> PathBuf {
        self.prefix(self.components.len())
    }

    /// Open the directory holding the last component, creating missing
    /// parents when `create` is set.
    fn open_parent(&self, create: bool) -> Result<(OwnedFd, CString), SecurityError> {
        let Some((name, parents)) = self.components.split_last() else {
            return Err(SecurityError::InvalidPath(format!(
                "{} names the root directory",
                self.root.display()
            )));
        };

        let mut dir: OwnedFd = File::open(&self.root)?.into();
        for (i, component) in parents.iter().enumerate() {
            let c_name = c_string(component)?;
            dir = match openat(&dir, &c_name, DIR_FLAGS, Mode::empty()) {
                Ok(fd) => fd,
                Err(Errno::NOENT) if create => {
                    mkdirat(&dir, &c_name, Mode::from_raw_mode(0o755))
                        .map_err(|e| os_error(self.prefix(i + 1), e))?;
                    openat(&dir, &c_name, DIR_FLAGS, Mode::empty())
                        .map_err(|e| os_error(self.prefix(i + 1), e))?
                }
                Err(e) => return Err(os_error(self.prefix(i + 1), e)),
            };
        }
        Ok((dir, c_string(name)?))
    }

    pub(crate) fn open_read(&self) -> Result<File, SecurityError> {
        let (dir, name) = self.open_parent(false)?;
        let fd = openat(
            &dir,
            &name,
            OFlags::RDONLY | OFlags::NOFOLLOW | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| os_error(self.full(), e))?;
        Ok(File::from(fd))
    }

    /// Create or truncate the file. Fails on a symlink in any position.
    pub(crate) fn create(&self) -> Result<File, SecurityError> {
        let (dir, name) = self.open_parent(true)?;
        let fd = openat(
            &dir,
            &name,
            OFlags::WRONLY | OFlags::CREATE | OFlags::TRUNC | OFlags::NOFOLLOW | OFlags::CLOEXEC,
            Mode::from_raw_mode(0o644),
        )
        .map_err(|e| os_error(self.full(), e))?;
        Ok(File::from(fd))
    }

    /// Write a sibling temp file and `renameat` it over the target. A link at
    /// the target is replaced, never followed.
    pub(crate) fn write_atomic(&self, contents: &[u8]) -> Result<(), SecurityError> {
        let (dir, name) = self.open_parent(true)?;
        let temp = c_string(format!(
            ".{}.{}.tmp",
            name.to_string_lossy(),
            Uuid::new_v4()
        ))?;
        let fd = openat(
            &dir,
            &temp,
            OFlags::WRONLY | OFlags::CREATE | OFlags::EXCL | OFlags::NOFOLLOW | OFlags::CLOEXEC,
            Mode::from_raw_mode(0o644),
        )
        .map_err(|e| os_error(self.full(), e))?;

        let mut file = File::from(fd);
        if let Err(e) = file.write_all(contents).and_then(|()| file.sync_all()) {
            let _ = unlinkat(&dir, &temp, AtFlags::empty());
            return Err(SecurityError::Io(e));
        }
        if let Err(e) = renameat(&dir, &temp, &dir, &name) {
            let _ = unlinkat(&dir, &temp, AtFlags::empty());
            return Err(os_error(self.full(), e));
        }
        Ok(())
    }

    pub(crate) fn remove(&self) -> Result<(), SecurityError> {
        let (dir, name) = self.open_parent(false)?;
        unlinkat(&dir, &name, AtFlags::empty()).map_err(|e| os_error(self.full(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn anchored(root: &Path, rel: &str) -> AnchoredPath {
        AnchoredPath::new(root, &root.join(rel)).unwrap()
    }

    #[test]
    fn test_create_nested_and_read_back() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();

        let path = anchored(&root, "a/b/c.txt");
        path.create().unwrap().write_all(b"nested").unwrap();
        assert_eq!(fs::read_to_string(root.join("a/b/c.txt")).unwrap(), "nested");

        let mut content = String::new();
        std::io::Read::read_to_string(&mut path.open_read().unwrap(), &mut content).unwrap();
        assert_eq!(content, "nested");
    }

    #[test]
    fn test_create_refuses_dangling_link() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let outside = tempdir().unwrap();
        let escaped = outside.path().join("pwned.md");
        std::os::unix::fs::symlink(&escaped, root.join("hello.md")).unwrap();

        let err = anchored(&root, "hello.md").create().unwrap_err();
        assert!(matches!(err, SecurityError::Symlink(_)));
        assert!(!escaped.exists());
    }

    #[test]
    fn test_create_refuses_linked_directory() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let outside = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("sub")).unwrap();

        let err = anchored(&root, "sub/x.txt").create().unwrap_err();
        assert!(err.is_traversal());
        assert!(!outside.path().join("x.txt").exists());
    }

    #[test]
    fn test_write_atomic_replaces_link_without_following() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let outside = tempdir().unwrap();
        let escaped = outside.path().join("hooks.json");
        std::os::unix::fs::symlink(&escaped, root.join("hooks.json")).unwrap();

        anchored(&root, "hooks.json").write_atomic(b"{}").unwrap();

        assert!(!escaped.exists());
        let meta = fs::symlink_metadata(root.join("hooks.json")).unwrap();
        assert!(meta.file_type().is_file());
        let leftovers = fs::read_dir(&root).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_root_itself_is_not_a_file() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let path = AnchoredPath::new(&root, &root).unwrap();
        assert!(matches!(path.create(), Err(SecurityError::InvalidPath(_))));
    }
}
