//! Placement configuration for one adaptation run.
//!
//! ```rust,no_run
//! use plugin_adapter::config::{PlacementContext, TargetAgent};
//!
//! # fn example() -> Result<(), plugin_adapter::config::ConfigError> {
//! let ctx = PlacementContext::builder()
//!     .target_root("./project")
//!     .marketplace("official")
//!     .plugin("formatter")
//!     .agent(TargetAgent::Cursor)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod layout;
pub mod placement;

pub use layout::{TargetLayout, to_slash};
pub use placement::{PlacementContext, PlacementContextBuilder, TargetAgent};

use thiserror::Error;

/// Errors raised while building a placement context.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A name used as a path component is unusable
    #[error("Invalid {field} '{name}': {reason}")]
    InvalidName {
        /// The configuration field
        field: &'static str,
        /// The rejected value
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A required field was not supplied
    #[error("Missing required field: {field}")]
    MissingField {
        /// The configuration field
        field: &'static str,
    },
}
