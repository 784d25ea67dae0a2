//! Component adapters.
//!
//! Each adapter takes one classified cluster of plugin files and writes its
//! target-side counterpart under the placement's target root. Every read and
//! write goes through [`SecureFs`]; a file that fails is recorded in
//! [`AdapterOutput::failures`] and the remaining files are still processed.

mod command;
mod document;
mod hooks;
mod skill;

pub use command::CommandAdapter;
pub use document::DocumentAdapter;
pub use hooks::HookAdapter;
pub use skill::SkillAdapter;

use std::path::{Path, PathBuf};

use crate::config::{PlacementContext, TargetLayout};
use crate::hooks::HookEventMap;
use crate::plugins::ComponentCluster;
use crate::security::{SecureFs, SecurityError};

/// A source file the run could not adapt.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: crate::Error,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// What a single adapter produced.
#[derive(Debug, Default)]
pub struct AdapterOutput {
    /// Created files, relative to the target root, without duplicates.
    pub files: Vec<PathBuf>,
    /// Hook entries contributed to the target manifest.
    pub hooks: HookEventMap,
    pub warnings: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl AdapterOutput {
    pub(crate) fn push_file(&mut self, path: PathBuf) {
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    pub(crate) fn fail(&mut self, path: &Path, error: impl Into<crate::Error>) {
        let error = error.into();
        tracing::warn!(path = %path.display(), error = %error, "Failed to adapt file");
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            error,
        });
    }

    pub(crate) fn extend(&mut self, other: AdapterOutput) {
        for file in other.files {
            self.push_file(file);
        }
        for (event, entries) in other.hooks {
            let list = self.hooks.entry(event).or_default();
            for entry in entries {
                crate::hooks::push_unique(list, entry);
            }
        }
        self.warnings.extend(other.warnings);
        self.failures.extend(other.failures);
    }
}

/// Shared state for one adaptation run.
#[derive(Debug)]
pub struct AdapterContext<'a> {
    placement: &'a PlacementContext,
    layout: TargetLayout,
    target: SecureFs,
    source_root: Option<SecureFs>,
}

impl<'a> AdapterContext<'a> {
    /// Creates the target root if it does not exist yet.
    pub fn new(placement: &'a PlacementContext) -> crate::Result<Self> {
        std::fs::create_dir_all(placement.target_root())?;
        let target = SecureFs::new(placement.target_root())?;
        let source_root = placement.source_root().map(SecureFs::new).transpose()?;
        Ok(Self {
            placement,
            layout: TargetLayout::new(placement),
            target,
            source_root,
        })
    }

    pub fn placement(&self) -> &PlacementContext {
        self.placement
    }

    pub fn layout(&self) -> &TargetLayout {
        &self.layout
    }

    pub fn target(&self) -> &SecureFs {
        &self.target
    }

    /// The trust boundary for reading `file`: the configured source root, or
    /// the file's own directory when none was given.
    pub fn source_fs(&self, file: &Path) -> Result<SecureFs, SecurityError> {
        if let Some(root) = &self.source_root {
            return Ok(root.clone());
        }
        let parent = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        SecureFs::new(parent)
    }

    /// Write into the target root and return the path relative to it.
    pub(crate) fn write(&self, dest: &Path, contents: impl AsRef<[u8]>) -> crate::Result<PathBuf> {
        let written = self.target.write(dest, contents)?;
        Ok(self.target.relative(written)?)
    }

    /// Copy a source file into the target root as an executable.
    pub(crate) fn install_script(
        &self,
        source: &SecureFs,
        src: &Path,
        dest: &Path,
    ) -> crate::Result<PathBuf> {
        let copied = self.target.copy_from(source, src, dest)?;
        self.target.set_executable(&copied)?;
        Ok(self.target.relative(copied)?)
    }
}

/// One component-kind strategy.
pub trait Adapter {
    fn name(&self) -> &'static str;

    fn adapt(&self, cluster: &ComponentCluster, ctx: &AdapterContext<'_>) -> AdapterOutput;
}

/// Directory under the rules root a document lands in, by its source location.
pub(crate) fn component_type(path: &Path) -> &'static str {
    use crate::common::has_segment;

    if has_segment(path, "commands") {
        "commands"
    } else if has_segment(path, "agents") {
        "agents"
    } else if has_segment(path, "skills") {
        "skills"
    } else {
        "misc"
    }
}
