use std::path::{Component, Path, PathBuf};

use super::PlacementContext;

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Output directories for one placement, all relative to the target root.
///
/// ```text
/// <target-root>/
/// └── .cursor/
///     ├── hooks.json
///     ├── rules/<marketplace>/<plugin>/<component-type>/<name>.mdc
///     ├── commands/<marketplace>/<plugin>/<name>.md
///     └── scripts/
///         ├── skills/<marketplace>/<plugin>/<skill>/...
///         ├── commands/<marketplace>/<plugin>/...
///         └── hooks/<marketplace>/<plugin>/...
/// ```
#[derive(Debug, Clone)]
pub struct TargetLayout {
    agent_dir: PathBuf,
    namespace: PathBuf,
}

impl TargetLayout {
    pub fn new(ctx: &PlacementContext) -> Self {
        Self {
            agent_dir: PathBuf::from(ctx.agent().config_dir()),
            namespace: ctx.namespace().as_path(),
        }
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.agent_dir.join("rules").join(&self.namespace)
    }

    pub fn commands_dir(&self) -> PathBuf {
        self.agent_dir.join("commands").join(&self.namespace)
    }

    fn scripts_dir(&self, kind: &str) -> PathBuf {
        self.agent_dir.join("scripts").join(kind)
    }

    /// Base for every skill's assets, without the namespace.
    pub fn skill_scripts_base(&self) -> PathBuf {
        self.scripts_dir("skills")
    }

    /// Namespaced root under which each skill gets its own directory.
    pub fn skill_scripts_root(&self) -> PathBuf {
        self.skill_scripts_base().join(&self.namespace)
    }

    pub fn command_scripts_root(&self) -> PathBuf {
        self.scripts_dir("commands").join(&self.namespace)
    }

    pub fn hook_scripts_root(&self) -> PathBuf {
        self.scripts_dir("hooks").join(&self.namespace)
    }

    pub fn hooks_manifest(&self) -> PathBuf {
        self.agent_dir.join("hooks.json")
    }
}
