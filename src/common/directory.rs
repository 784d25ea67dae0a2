use std::path::{Component, Path};

pub const SKILL_ANCHOR: &str = "SKILL.md";
pub const HOOKS_DOCUMENT: &str = "hooks.json";

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("mdc"))
}

pub fn is_skill_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(SKILL_ANCHOR))
}

pub fn is_hooks_document(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == HOOKS_DOCUMENT)
}

/// True when `segment` appears as a directory component of `path`.
pub fn has_segment(path: &Path, segment: &str) -> bool {
    let mut components = path.components().peekable();
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        if matches!(component, Component::Normal(name) if name == segment) {
            return true;
        }
    }
    false
}

/// File name without its final extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
