//! Source-side hooks document types.
//!
//! Format: `{"hooks": {"PostToolUse": [{"matcher": "Write|Edit", "hooks": [{"type": "command", "command": "..."}]}]}}`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::manifest::HookEntry;

/// A whole `hooks.json` as shipped by a plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksDocument {
    pub hooks: BTreeMap<String, Vec<HookRule>>,
}

/// A hook rule entry mapping an optional matcher to a list of actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRule {
    #[serde(default)]
    pub matcher: Option<String>,
    #[serde(default)]
    pub hooks: Vec<HookAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Command,
    Prompt,
    Other,
}

/// A single hook action within a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookAction {
    #[serde(rename = "type")]
    pub hook_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<serde_json::Number>,
}

impl HookAction {
    pub fn kind(&self) -> HookKind {
        match self.hook_type.as_str() {
            "command" => HookKind::Command,
            "prompt" => HookKind::Prompt,
            _ => HookKind::Other,
        }
    }

    /// Returns `None` unless this is a `"command"` action with a command.
    pub fn to_hook_entry(&self) -> Option<HookEntry> {
        if self.kind() != HookKind::Command {
            return None;
        }
        let command = self.command.as_ref()?.clone();
        Some(HookEntry::new(command).with_timeout(self.timeout.clone()))
    }
}
