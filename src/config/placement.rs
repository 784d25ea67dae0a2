use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::common::FieldValue;
use crate::plugins::namespace::{Namespace, validate_segment};

/// The assistant whose conventions output files follow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetAgent {
    /// `.cursor/` layout, `.mdc` rules with `globs`/`alwaysApply`.
    #[default]
    Cursor,
    /// Any other agent: `.<id>/` layout, plain `.md` documents.
    Other(String),
}

impl TargetAgent {
    pub fn id(&self) -> &str {
        match self {
            TargetAgent::Cursor => "cursor",
            TargetAgent::Other(id) => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            TargetAgent::Cursor => "Cursor",
            TargetAgent::Other(id) => id,
        }
    }

    /// Per-agent configuration directory under the target root.
    pub fn config_dir(&self) -> String {
        format!(".{}", self.id())
    }

    pub fn rule_extension(&self) -> &'static str {
        match self {
            TargetAgent::Cursor => "mdc",
            TargetAgent::Other(_) => "md",
        }
    }

    /// Keys every rule document must carry for this agent.
    pub fn rule_defaults(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            TargetAgent::Cursor => vec![
                ("globs", FieldValue::empty_list()),
                ("alwaysApply", FieldValue::raw("false")),
            ],
            TargetAgent::Other(_) => Vec::new(),
        }
    }
}

impl FromStr for TargetAgent {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("cursor") {
            return Ok(TargetAgent::Cursor);
        }
        validate_segment("agent", trimmed)?;
        Ok(TargetAgent::Other(trimmed.to_string()))
    }
}

impl TryFrom<String> for TargetAgent {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetAgent> for String {
    fn from(agent: TargetAgent) -> Self {
        agent.id().to_string()
    }
}

impl std::fmt::Display for TargetAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Where and under which namespace adapted files are placed.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawPlacement")]
pub struct PlacementContext {
    target_root: PathBuf,
    namespace: Namespace,
    agent: TargetAgent,
    source_root: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlacement {
    target_root: PathBuf,
    marketplace_name: String,
    plugin_name: String,
    #[serde(default)]
    agent: TargetAgent,
    #[serde(default)]
    source_root: Option<PathBuf>,
}

impl TryFrom<RawPlacement> for PlacementContext {
    type Error = ConfigError;

    fn try_from(raw: RawPlacement) -> Result<Self, Self::Error> {
        let mut builder = PlacementContext::builder()
            .target_root(raw.target_root)
            .marketplace(raw.marketplace_name)
            .plugin(raw.plugin_name)
            .agent(raw.agent);
        if let Some(source_root) = raw.source_root {
            builder = builder.source_root(source_root);
        }
        builder.build()
    }
}

impl PlacementContext {
    pub fn builder() -> PlacementContextBuilder {
        PlacementContextBuilder::default()
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn agent(&self) -> &TargetAgent {
        &self.agent
    }

    /// Plugin checkout that source reads are confined to, when known.
    pub fn source_root(&self) -> Option<&Path> {
        self.source_root.as_deref()
    }
}

#[derive(Default)]
pub struct PlacementContextBuilder {
    target_root: Option<PathBuf>,
    marketplace: Option<String>,
    plugin: Option<String>,
    agent: Option<TargetAgent>,
    source_root: Option<PathBuf>,
}

impl PlacementContextBuilder {
    pub fn target_root(mut self, path: impl AsRef<Path>) -> Self {
        self.target_root = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn marketplace(mut self, name: impl Into<String>) -> Self {
        self.marketplace = Some(name.into());
        self
    }

    pub fn plugin(mut self, name: impl Into<String>) -> Self {
        self.plugin = Some(name.into());
        self
    }

    pub fn agent(mut self, agent: TargetAgent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn source_root(mut self, path: impl AsRef<Path>) -> Self {
        self.source_root = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<PlacementContext, ConfigError> {
        let target_root = self.target_root.ok_or(ConfigError::MissingField {
            field: "targetRoot",
        })?;
        let marketplace = self.marketplace.ok_or(ConfigError::MissingField {
            field: "marketplaceName",
        })?;
        let plugin = self.plugin.ok_or(ConfigError::MissingField {
            field: "pluginName",
        })?;

        Ok(PlacementContext {
            target_root,
            namespace: Namespace::new(marketplace, plugin)?,
            agent: self.agent.unwrap_or_default(),
            source_root: self.source_root,
        })
    }
}
