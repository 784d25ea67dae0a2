//! Plugin classification and dispatch.
//!
//! A plugin arrives as a flat list of files. They are partitioned into
//! component clusters by location and name, and each cluster is handed to
//! its adapter:
//!
//! ```text
//! my-plugin/
//! ├── skills/
//! │   └── commit/
//! │       ├── SKILL.md          → skill (anchor + every file below commit/)
//! │       └── scripts/check.sh
//! ├── commands/
//! │   └── hello.md              → command
//! ├── hooks/
//! │   └── hooks.json            → hooks
//! ├── agents/
//! │   └── reviewer.md           → dropped
//! ├── README.md                 → document
//! └── logo.png                  → unclassified
//! ```
//!
//! Outputs are namespaced as `<marketplace>/<plugin>` so that plugins never
//! overwrite each other.

mod classify;
mod dispatcher;
pub mod namespace;

pub use classify::{ComponentCluster, ComponentKind, classify};
pub use dispatcher::{AdaptResult, Dispatcher, adapt, remove_hooks};
pub use namespace::Namespace;
