//! Lifecycle event vocabulary translation.

use std::sync::OnceLock;

use regex::Regex;

/// Source lifecycle events a plugin can bind hooks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    Stop,
    SubagentStop,
    SessionStart,
    SessionEnd,
    PreCompact,
    Notification,
    PermissionRequest,
}

impl HookEvent {
    pub fn from_pascal_case(name: &str) -> Option<Self> {
        Some(match name {
            "PreToolUse" => HookEvent::PreToolUse,
            "PostToolUse" => HookEvent::PostToolUse,
            "UserPromptSubmit" => HookEvent::UserPromptSubmit,
            "Stop" => HookEvent::Stop,
            "SubagentStop" => HookEvent::SubagentStop,
            "SessionStart" => HookEvent::SessionStart,
            "SessionEnd" => HookEvent::SessionEnd,
            "PreCompact" => HookEvent::PreCompact,
            "Notification" => HookEvent::Notification,
            "PermissionRequest" => HookEvent::PermissionRequest,
            _ => return None,
        })
    }

    /// Events with no counterpart on the target side.
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            HookEvent::SessionStart
                | HookEvent::SessionEnd
                | HookEvent::PreCompact
                | HookEvent::Notification
                | HookEvent::PermissionRequest
        )
    }
}

/// Target lifecycle events written into the hook manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetEvent {
    BeforeShellExecution,
    AfterShellExecution,
    AfterFileEdit,
    BeforeSubmitPrompt,
    Stop,
}

impl TargetEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetEvent::BeforeShellExecution => "beforeShellExecution",
            TargetEvent::AfterShellExecution => "afterShellExecution",
            TargetEvent::AfterFileEdit => "afterFileEdit",
            TargetEvent::BeforeSubmitPrompt => "beforeSubmitPrompt",
            TargetEvent::Stop => "stop",
        }
    }
}

impl std::fmt::Display for TargetEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn file_edit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:write|edit|multiedit|notebookedit)(?:\s*\|\s*(?:write|edit|multiedit|notebookedit))*\s*$",
        )
        .expect("valid file edit matcher regex")
    })
}

/// True when a matcher selects only file-editing tools.
pub fn is_file_edit_matcher(matcher: &str) -> bool {
    file_edit_regex().is_match(matcher)
}

/// Map a source event (plus its rule matcher) to a target event.
///
/// Returns `None` for unsupported and unknown events.
pub fn translate(event: &str, matcher: Option<&str>) -> Option<TargetEvent> {
    let event = HookEvent::from_pascal_case(event)?;
    Some(match event {
        HookEvent::PreToolUse => TargetEvent::BeforeShellExecution,
        HookEvent::PostToolUse => {
            if matcher.is_some_and(is_file_edit_matcher) {
                TargetEvent::AfterFileEdit
            } else {
                TargetEvent::AfterShellExecution
            }
        }
        HookEvent::UserPromptSubmit => TargetEvent::BeforeSubmitPrompt,
        HookEvent::Stop | HookEvent::SubagentStop => TargetEvent::Stop,
        HookEvent::SessionStart
        | HookEvent::SessionEnd
        | HookEvent::PreCompact
        | HookEvent::Notification
        | HookEvent::PermissionRequest => return None,
    })
}

/// True when a whole event entry must be skipped.
pub fn is_unsupported(event: &str) -> bool {
    HookEvent::from_pascal_case(event).is_none_or(|e| !e.is_supported())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_mappings() {
        assert_eq!(
            translate("PreToolUse", Some("Bash")),
            Some(TargetEvent::BeforeShellExecution)
        );
        assert_eq!(
            translate("UserPromptSubmit", None),
            Some(TargetEvent::BeforeSubmitPrompt)
        );
        assert_eq!(translate("Stop", None), Some(TargetEvent::Stop));
        assert_eq!(translate("SubagentStop", None), Some(TargetEvent::Stop));
    }

    #[test]
    fn test_post_tool_use_split() {
        assert_eq!(
            translate("PostToolUse", Some("Write|Edit")),
            Some(TargetEvent::AfterFileEdit)
        );
        assert_eq!(
            translate("PostToolUse", Some("Bash")),
            Some(TargetEvent::AfterShellExecution)
        );
        assert_eq!(
            translate("PostToolUse", None),
            Some(TargetEvent::AfterShellExecution)
        );
    }

    #[test]
    fn test_file_edit_matcher_variants() {
        for m in [
            "Write",
            "edit",
            "Edit|Write",
            "Write | Edit | NotebookEdit",
            "MultiEdit|write",
            " NOTEBOOKEDIT ",
        ] {
            assert!(is_file_edit_matcher(m), "{m} should match");
        }
        for m in ["Bash", "Write|Bash", "", "*", "Editor", "Read|Edit"] {
            assert!(!is_file_edit_matcher(m), "{m} should not match");
        }
    }

    #[test]
    fn test_unsupported_events() {
        for e in [
            "SessionStart",
            "SessionEnd",
            "PreCompact",
            "Notification",
            "PermissionRequest",
        ] {
            assert!(is_unsupported(e));
            assert_eq!(translate(e, None), None);
        }
        assert!(is_unsupported("MadeUpEvent"));
        assert!(!is_unsupported("PostToolUse"));
    }

    #[test]
    fn test_target_event_names() {
        assert_eq!(TargetEvent::AfterFileEdit.to_string(), "afterFileEdit");
        assert_eq!(TargetEvent::Stop.as_str(), "stop");
    }
}
