use std::path::PathBuf;

use crate::config::ConfigError;

pub const NAMESPACE_SEP: char = ':';

pub fn namespaced(plugin: &str, resource: &str) -> String {
    format!("{}{}{}", plugin, NAMESPACE_SEP, resource)
}

pub fn parse(name: &str) -> Option<(&str, &str)> {
    name.split_once(NAMESPACE_SEP)
}

/// Check that `name` can be used as a single directory component.
pub fn validate_segment(field: &'static str, name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("must not be empty")
    } else if name == "." || name == ".." {
        Some("must not be a relative directory reference")
    } else if name.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if name.contains(NAMESPACE_SEP) {
        Some("must not contain the namespace separator")
    } else if name.contains('\0') {
        Some("must not contain null bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidName {
            field,
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// The marketplace/plugin pair that keeps one plugin's output apart from
/// every other plugin installed into the same workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    marketplace: String,
    plugin: String,
}

impl Namespace {
    pub fn new(marketplace: impl Into<String>, plugin: impl Into<String>) -> Result<Self, ConfigError> {
        let marketplace = marketplace.into();
        let plugin = plugin.into();
        validate_segment("marketplaceName", &marketplace)?;
        validate_segment("pluginName", &plugin)?;
        Ok(Self {
            marketplace,
            plugin,
        })
    }

    pub fn marketplace(&self) -> &str {
        &self.marketplace
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// `<marketplace>/<plugin>` as a relative path.
    pub fn as_path(&self) -> PathBuf {
        PathBuf::from(&self.marketplace).join(&self.plugin)
    }

    /// `marketplace:plugin`, used in log fields and labels.
    pub fn label(&self) -> String {
        namespaced(&self.marketplace, &self.plugin)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Namespace {
    type Err = ConfigError;

    /// Parse a `marketplace:plugin` label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (marketplace, plugin) = parse(s).ok_or_else(|| ConfigError::InvalidName {
            field: "namespace",
            name: s.to_string(),
            reason: "expected <marketplace>:<plugin>".to_string(),
        })?;
        Namespace::new(marketplace, plugin)
    }
}
