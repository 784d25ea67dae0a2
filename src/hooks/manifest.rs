//! Target hook manifest: the shared `hooks.json` under the agent directory.
//!
//! Several plugins contribute to the same manifest, so it is only ever
//! merged into, never overwritten wholesale.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::security::{SecureFs, SecurityError};

pub const MANIFEST_VERSION: u32 = 1;

/// One command bound to a target event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<serde_json::Number>,
    /// Fields written by other tools, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HookEntry {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            extra: Map::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<serde_json::Number>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Target event name to its ordered, command-unique entries.
pub type HookEventMap = BTreeMap<String, Vec<HookEntry>>;

/// Append `entry` unless an entry with the same command is already listed.
pub fn push_unique(list: &mut Vec<HookEntry>, entry: HookEntry) -> bool {
    if list.iter().any(|e| e.command == entry.command) {
        return false;
    }
    list.push(entry);
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetHookManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub hooks: HookEventMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

impl Default for TargetHookManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            hooks: HookEventMap::new(),
            extra: Map::new(),
        }
    }
}

impl TargetHookManifest {
    /// Union `incoming` into this manifest. Returns the number of entries added.
    pub fn merge(&mut self, incoming: &HookEventMap) -> usize {
        let mut added = 0;
        for (event, entries) in incoming {
            let list = self.hooks.entry(event.clone()).or_default();
            for entry in entries {
                if push_unique(list, entry.clone()) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Drop every entry whose command matches one in `contributed`.
    /// Events left without entries are removed. Returns the number removed.
    pub fn remove_contributed(&mut self, contributed: &HookEventMap) -> usize {
        let mut removed = 0;
        for (event, entries) in contributed {
            let Some(list) = self.hooks.get_mut(event) else {
                continue;
            };
            let before = list.len();
            list.retain(|e| !entries.iter().any(|c| c.command == e.command));
            removed += before - list.len();
        }
        self.hooks.retain(|_, list| !list.is_empty());
        removed
    }

    pub fn entry_count(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// Loads and saves the manifest at a fixed path inside the target root.
#[derive(Debug, Clone)]
pub struct HookManifestStore {
    fs: SecureFs,
    path: PathBuf,
}

impl HookManifestStore {
    pub fn new(fs: SecureFs, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unparseable manifests load as empty.
    pub fn load(&self) -> crate::Result<TargetHookManifest> {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(SecurityError::NotFound(_)) => return Ok(TargetHookManifest::default()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Existing hook manifest is not valid JSON, starting from empty"
                );
                Ok(TargetHookManifest::default())
            }
        }
    }

    /// Write the manifest atomically with `version` forced to the current one.
    pub fn save(&self, manifest: &TargetHookManifest) -> crate::Result<PathBuf> {
        let mut manifest = manifest.clone();
        manifest.version = MANIFEST_VERSION;
        let mut json = serde_json::to_string_pretty(&manifest)?;
        json.push('\n');
        Ok(self.fs.write_atomic(&self.path, json)?)
    }

    /// Load, union with `incoming`, save. Returns the saved path and entries added.
    pub fn merge(&self, incoming: &HookEventMap) -> crate::Result<(PathBuf, usize)> {
        let mut manifest = self.load()?;
        let added = manifest.merge(incoming);
        let path = self.save(&manifest)?;
        tracing::debug!(path = %path.display(), added, "Merged hook manifest");
        Ok((path, added))
    }

    /// Remove a plugin's contributed entries. Deletes the manifest once no
    /// hooks remain and returns whether it was deleted.
    pub fn remove_contributed(&self, contributed: &HookEventMap) -> crate::Result<bool> {
        if !self.fs.is_file(&self.path) {
            return Ok(false);
        }
        let mut manifest = self.load()?;
        let removed = manifest.remove_contributed(contributed);
        if manifest.is_empty() && manifest.extra.is_empty() {
            self.fs.remove_file(&self.path)?;
            tracing::debug!(path = %self.path.display(), removed, "Removed empty hook manifest");
            return Ok(true);
        }
        self.save(&manifest)?;
        tracing::debug!(path = %self.path.display(), removed, "Removed contributed hooks");
        Ok(false)
    }
}
