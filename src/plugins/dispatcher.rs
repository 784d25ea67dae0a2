use std::path::{Path, PathBuf};

use super::classify::{ComponentCluster, classify};
use crate::adapters::{
    Adapter, AdapterContext, AdapterOutput, CommandAdapter, DocumentAdapter, FileFailure,
    HookAdapter, SkillAdapter,
};
use crate::config::PlacementContext;
use crate::hooks::{HookEventMap, HookManifestStore};

/// Everything one adaptation run produced or declined to produce.
#[derive(Debug, Default)]
pub struct AdaptResult {
    /// Created files, relative to the target root.
    pub files: Vec<PathBuf>,
    /// Hook entries this plugin contributed, for later removal.
    pub hooks: HookEventMap,
    /// Source files intentionally not translated.
    pub dropped: Vec<PathBuf>,
    /// Source files no adapter claimed.
    pub unclassified: Vec<PathBuf>,
    pub warnings: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl AdaptResult {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn path_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Routes classified clusters to their adapters.
#[derive(Debug, Default)]
pub struct Dispatcher {
    skill: SkillAdapter,
    command: CommandAdapter,
    hooks: HookAdapter,
    document: DocumentAdapter,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn adapter_for(&self, cluster: &ComponentCluster) -> Option<&dyn Adapter> {
        match cluster {
            ComponentCluster::Skill { .. } => Some(&self.skill),
            ComponentCluster::Command { .. } => Some(&self.command),
            ComponentCluster::HookManifest { .. } => Some(&self.hooks),
            ComponentCluster::Document { .. } => Some(&self.document),
            ComponentCluster::Unsupported { .. } | ComponentCluster::Unclassified { .. } => None,
        }
    }

    #[tracing::instrument(skip_all, fields(plugin = %placement.namespace(), files = files.len()))]
    pub fn run(&self, files: &[PathBuf], placement: &PlacementContext) -> crate::Result<AdaptResult> {
        let ctx = AdapterContext::new(placement)?;
        let mut combined = AdapterOutput::default();
        let mut result = AdaptResult::default();

        for cluster in classify(files) {
            match &cluster {
                ComponentCluster::Unsupported { files } => {
                    combined.warn(format!(
                        "Dropped {} agent file(s) with no {} equivalent: {}",
                        files.len(),
                        placement.agent().display_name(),
                        path_list(files)
                    ));
                    result.dropped.extend(files.iter().cloned());
                }
                ComponentCluster::Unclassified { files } => {
                    combined.warn(format!(
                        "{} file(s) not recognised as plugin components: {}",
                        files.len(),
                        path_list(files)
                    ));
                    result.unclassified.extend(files.iter().cloned());
                }
                _ => {}
            }

            let Some(adapter) = self.adapter_for(&cluster) else {
                continue;
            };
            tracing::debug!(adapter = adapter.name(), files = cluster.files().len(), "Adapting cluster");
            combined.extend(adapter.adapt(&cluster, &ctx));
        }

        result.files = combined.files;
        result.hooks = combined.hooks;
        result.warnings = combined.warnings;
        result.failures = combined.failures;
        tracing::info!(
            created = result.files.len(),
            failures = result.failures.len(),
            warnings = result.warnings.len(),
            "Plugin adaptation finished"
        );
        Ok(result)
    }
}

/// Adapt a plugin's files into the placement's target root.
pub fn adapt<P: AsRef<Path>>(files: &[P], placement: &PlacementContext) -> crate::Result<AdaptResult> {
    let files: Vec<PathBuf> = files.iter().map(|f| f.as_ref().to_path_buf()).collect();
    Dispatcher::new().run(&files, placement)
}

/// Remove the hook entries a previous run contributed. Returns whether the
/// manifest was deleted because nothing was left in it.
pub fn remove_hooks(placement: &PlacementContext, contributed: &HookEventMap) -> crate::Result<bool> {
    let target = crate::security::SecureFs::new(placement.target_root())?;
    let layout = crate::config::TargetLayout::new(placement);
    HookManifestStore::new(target, layout.hooks_manifest()).remove_contributed(contributed)
}
