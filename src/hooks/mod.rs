//! Hook translation: source hooks documents in, target hook manifest out.

pub mod events;
pub mod manifest;
mod rule;

pub use events::{HookEvent, TargetEvent, is_file_edit_matcher, is_unsupported, translate};
pub use manifest::{
    HookEntry, HookEventMap, HookManifestStore, MANIFEST_VERSION, TargetHookManifest, push_unique,
};
pub use rule::{HookAction, HookKind, HookRule, HooksDocument};
