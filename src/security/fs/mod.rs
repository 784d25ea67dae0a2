//! Filesystem access bound to a single base directory.

mod handle;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use handle::AnchoredPath;

use super::SecurityError;
use super::path::{canonical_base, resolve_within};

/// A filesystem handle whose every operation is confined to `root`.
///
/// Paths are validated against the root first, then opened component by
/// component from the root directory without following symlinks. The soft
/// checks (`is_dir`, `is_file`, `glob`) swallow violations and report
/// "nothing there" instead.
#[derive(Debug, Clone)]
pub struct SecureFs {
    root_path: PathBuf,
}

impl SecureFs {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SecurityError> {
        Ok(Self {
            root_path: canonical_base(Some(root.as_ref()))?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, SecurityError> {
        resolve_within(path.as_ref(), &self.root_path)
    }

    /// Path of `path` relative to the root, after validation.
    pub fn relative(&self, path: impl AsRef<Path>) -> Result<PathBuf, SecurityError> {
        let resolved = self.resolve(path)?;
        Ok(resolved
            .strip_prefix(&self.root_path)
            .map(Path::to_path_buf)
            .unwrap_or_default())
    }

    fn anchor(&self, path: &Path) -> Result<(PathBuf, AnchoredPath), SecurityError> {
        let resolved = self.resolve(path)?;
        let anchored = AnchoredPath::new(&self.root_path, &resolved)?;
        Ok((resolved, anchored))
    }

    fn open_file(&self, path: &Path) -> Result<std::fs::File, SecurityError> {
        let (resolved, anchored) = self.anchor(path)?;
        let file = match anchored.open_read() {
            Ok(file) => file,
            Err(SecurityError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SecurityError::NotFound(resolved));
            }
            Err(e) => return Err(e),
        };
        if !file.metadata()?.is_file() {
            return Err(SecurityError::NotFound(resolved));
        }
        Ok(file)
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Result<String, SecurityError> {
        let mut content = String::new();
        self.open_file(path.as_ref())?.read_to_string(&mut content)?;
        Ok(content)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, SecurityError> {
        let mut content = Vec::new();
        self.open_file(path.as_ref())?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Write `contents`, creating parent directories as needed.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf, SecurityError> {
        let (resolved, anchored) = self.anchor(path.as_ref())?;
        let mut file = anchored.create()?;
        file.write_all(contents.as_ref())?;
        Ok(resolved)
    }

    /// Write through a sibling temp file and rename it into place.
    pub fn write_atomic(
        &self,
        path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf, SecurityError> {
        let (resolved, anchored) = self.anchor(path.as_ref())?;
        anchored.write_atomic(contents.as_ref())?;
        Ok(resolved)
    }

    /// Copy a file validated against `source` into this root, byte for byte,
    /// keeping its permission bits.
    pub fn copy_from(
        &self,
        source: &SecureFs,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<PathBuf, SecurityError> {
        let mut input = source.open_file(src.as_ref())?;
        let (resolved, anchored) = self.anchor(dest.as_ref())?;
        let mut output = anchored.create()?;
        std::io::copy(&mut input, &mut output)?;
        output.set_permissions(input.metadata()?.permissions())?;
        Ok(resolved)
    }

    /// Add execute permission for user, group and other.
    pub fn set_executable(&self, path: impl AsRef<Path>) -> Result<(), SecurityError> {
        use std::os::unix::fs::PermissionsExt;

        let file = self.open_file(path.as_ref())?;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        file.set_permissions(perms)?;
        Ok(())
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) -> Result<(), SecurityError> {
        self.open_file(path.as_ref())?;
        let (_, anchored) = self.anchor(path.as_ref())?;
        anchored.remove()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).map(|p| p.is_dir()).unwrap_or(false)
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Glob relative to the root. Invalid patterns, unreadable entries and
    /// matches that resolve outside the root are dropped silently.
    pub fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let full = self.root_path.join(pattern);
        let Some(full) = full.to_str() else {
            return Vec::new();
        };
        let Ok(paths) = glob::glob(full) else {
            tracing::debug!(pattern, "Invalid glob pattern");
            return Vec::new();
        };
        paths
            .filter_map(Result::ok)
            .filter_map(|p| self.resolve(&p).ok())
            .collect()
    }
}
