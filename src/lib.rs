//! # plugin-adapter
//!
//! Adapts Claude Code plugins for use in Cursor (and agents following the
//! same conventions).
//!
//! A plugin is handed over as a flat list of files. Skills become rules plus
//! executable assets, commands become flat command files with their scripts
//! bundled, `hooks.json` is translated into the target's hook vocabulary and
//! merged into the workspace-wide hook manifest, and plain Markdown becomes
//! rules. Every file operation is confined to the plugin checkout on the read
//! side and to the target root on the write side.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plugin_adapter::{PlacementContext, adapt};
//!
//! fn main() -> Result<(), plugin_adapter::Error> {
//!     let placement = PlacementContext::builder()
//!         .target_root("./project")
//!         .marketplace("official")
//!         .plugin("formatter")
//!         .source_root("./plugins/formatter")
//!         .build()?;
//!
//!     let result = adapt(
//!         &[
//!             "./plugins/formatter/skills/fmt/SKILL.md",
//!             "./plugins/formatter/hooks/hooks.json",
//!         ],
//!         &placement,
//!     )?;
//!     for file in &result.files {
//!         println!("created {}", file.display());
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod adapters;
pub mod common;
pub mod config;
pub mod hooks;
pub mod plugins;
pub mod security;

pub use adapters::{AdapterOutput, FileFailure};
pub use config::{ConfigError, PlacementContext, PlacementContextBuilder, TargetAgent, TargetLayout};
pub use hooks::{HookEntry, HookEventMap, HookManifestStore, TargetEvent, TargetHookManifest};
pub use plugins::{AdaptResult, ComponentCluster, ComponentKind, Dispatcher, adapt, classify, remove_hooks};
pub use security::{SecureFs, SecurityError};

/// Error type for plugin adaptation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A path was rejected by the trust boundary or could not be found.
    #[error("Security violation: {0}")]
    Security(SecurityError),

    /// Invalid placement configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse a metadata block.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A hooks document could not be understood.
    #[error("Invalid hooks document {path}: {reason}")]
    InvalidHooks {
        path: std::path::PathBuf,
        reason: String,
    },

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Trust-boundary violations and missing plugin files
    Security,
    /// Placement configuration errors
    Configuration,
    /// Malformed plugin content (metadata blocks, hooks documents)
    Content,
    /// Internal errors (IO, JSON)
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Security(_) => ErrorCategory::Security,
            Error::Config(_) => ErrorCategory::Configuration,
            Error::Parse(_) | Error::InvalidHooks { .. } => ErrorCategory::Content,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_path_traversal(&self) -> bool {
        matches!(self, Error::Security(e) if e.is_traversal())
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

impl From<SecurityError> for Error {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::Io(e) => Error::Io(e),
            other => Error::Security(other),
        }
    }
}

/// Result type alias for plugin adaptation.
pub type Result<T> = std::result::Result<T, Error>;
