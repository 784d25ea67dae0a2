mod directory;
pub mod frontmatter;

pub use directory::{
    HOOKS_DOCUMENT, SKILL_ANCHOR, file_stem, has_segment, is_hooks_document, is_markdown,
    is_skill_file,
};
pub use frontmatter::{FieldValue, MetadataBlock};

/// Placeholder the source ecosystem substitutes with the installed plugin root.
pub const PLUGIN_ROOT_VAR: &str = "${CLAUDE_PLUGIN_ROOT}";
