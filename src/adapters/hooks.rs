use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::command::referenced_scripts;
use super::{Adapter, AdapterContext, AdapterOutput};
use crate::common::PLUGIN_ROOT_VAR;
use crate::config::to_slash;
use crate::hooks::{
    HookEntry, HookEventMap, HookKind, HookManifestStore, HooksDocument, is_unsupported,
    push_unique, translate,
};
use crate::plugins::ComponentCluster;
use crate::security::SecureFs;

/// Translates a plugin's `hooks.json` and merges it into the target manifest.
#[derive(Debug, Default, Clone, Copy)]
pub struct HookAdapter;

/// Directory that `${CLAUDE_PLUGIN_ROOT}` stands for, given the hooks document.
pub(crate) fn plugin_root_for(document: &Path) -> PathBuf {
    let dir = document.parent().unwrap_or(Path::new("."));
    match dir.file_name() {
        Some(name) if name == "hooks" => dir.parent().unwrap_or(dir).to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

#[derive(Debug, Default)]
struct Translation {
    hooks: HookEventMap,
    unsupported: BTreeSet<String>,
    prompts: usize,
}

fn translate_document(doc: &HooksDocument) -> Translation {
    let mut out = Translation::default();
    for (event, rules) in &doc.hooks {
        if is_unsupported(event) {
            out.unsupported.insert(event.clone());
            continue;
        }
        for rule in rules {
            let Some(target) = translate(event, rule.matcher.as_deref()) else {
                continue;
            };
            for action in &rule.hooks {
                if action.kind() == HookKind::Prompt {
                    out.prompts += 1;
                    continue;
                }
                let Some(entry) = action.to_hook_entry() else {
                    tracing::debug!(event = %event, hook_type = %action.hook_type, "Skipping hook");
                    continue;
                };
                let list = out.hooks.entry(target.as_str().to_string()).or_default();
                push_unique(list, entry);
            }
        }
    }
    out
}

impl HookAdapter {
    /// First file in `files` that parses as a hooks document. Unrecognised
    /// candidates are warnings when another one is picked, failures otherwise.
    fn select_document(
        &self,
        files: &[PathBuf],
        ctx: &AdapterContext<'_>,
        output: &mut AdapterOutput,
    ) -> Option<(PathBuf, HooksDocument)> {
        let mut rejected: Vec<(PathBuf, String)> = Vec::new();
        let mut selected = None;
        for file in files {
            let text = match ctx
                .source_fs(file)
                .and_then(|source| source.read_to_string(file))
            {
                Ok(text) => text,
                Err(e) => {
                    output.fail(file, e);
                    continue;
                }
            };
            match serde_json::from_str::<HooksDocument>(&text) {
                Ok(doc) => {
                    selected = Some((file.clone(), doc));
                    break;
                }
                Err(e) => rejected.push((file.clone(), e.to_string())),
            }
        }

        for (path, reason) in rejected {
            if selected.is_some() {
                output.warn(format!(
                    "Ignoring {}: not a hooks document ({})",
                    path.display(),
                    reason
                ));
            } else {
                let error = crate::Error::InvalidHooks {
                    path: path.clone(),
                    reason,
                };
                output.fail(&path, error);
            }
        }
        selected
    }

    /// Copy the scripts `entry` references and point it at the copies. The
    /// command is left untouched when it names no script path, when a script
    /// is missing, or when a copy fails.
    fn install_scripts(
        &self,
        entry: &mut HookEntry,
        plugin: &SecureFs,
        ctx: &AdapterContext<'_>,
        output: &mut AdapterOutput,
    ) {
        if !entry.command.contains(PLUGIN_ROOT_VAR) {
            return;
        }
        let refs = referenced_scripts(&entry.command);
        if refs.is_empty() {
            output.warn(format!(
                "Hook command `{}` uses {} without a script path, command left unchanged",
                entry.command, PLUGIN_ROOT_VAR
            ));
            return;
        }
        let missing: Vec<&String> = refs.iter().filter(|rel| !plugin.is_file(rel)).collect();
        if !missing.is_empty() {
            for rel in missing {
                output.warn(format!(
                    "Hook script {} not found under {}, command left unchanged",
                    rel,
                    plugin.root().display()
                ));
            }
            return;
        }

        let scripts_root = ctx.layout().hook_scripts_root();
        for rel in &refs {
            match ctx.install_script(plugin, Path::new(rel), &scripts_root.join(rel)) {
                Ok(copied) => output.push_file(copied),
                Err(e) => {
                    output.fail(&plugin.root().join(rel), e);
                    output.warn(format!(
                        "Hook script {} could not be installed, command left unchanged",
                        rel
                    ));
                    return;
                }
            }
        }
        entry.command = entry
            .command
            .replace(PLUGIN_ROOT_VAR, &to_slash(&scripts_root));
    }

    fn adapt_document(
        &self,
        path: &Path,
        doc: &HooksDocument,
        ctx: &AdapterContext<'_>,
        output: &mut AdapterOutput,
    ) -> crate::Result<()> {
        let mut translation = translate_document(doc);

        if !translation.unsupported.is_empty() {
            let events: Vec<&str> = translation.unsupported.iter().map(String::as_str).collect();
            output.warn(format!(
                "Skipped hooks for events with no {} equivalent: {}",
                ctx.placement().agent().display_name(),
                events.join(", ")
            ));
        }
        if translation.prompts > 0 {
            output.warn(format!(
                "Skipped {} prompt hook(s): prompt hooks cannot be translated",
                translation.prompts
            ));
        }

        let plugin = SecureFs::new(plugin_root_for(path))?;
        for entries in translation.hooks.values_mut() {
            for entry in entries.iter_mut() {
                self.install_scripts(entry, &plugin, ctx, output);
            }
        }

        if translation.hooks.is_empty() {
            tracing::debug!(path = %path.display(), "No translatable hooks");
            return Ok(());
        }

        let store = HookManifestStore::new(ctx.target().clone(), ctx.layout().hooks_manifest());
        let (manifest, added) = store.merge(&translation.hooks)?;
        output.push_file(ctx.target().relative(manifest)?);
        tracing::debug!(path = %path.display(), added, "Adapted hooks");

        for (event, entries) in translation.hooks {
            let list = output.hooks.entry(event).or_default();
            for entry in entries {
                push_unique(list, entry);
            }
        }
        Ok(())
    }
}

impl Adapter for HookAdapter {
    fn name(&self) -> &'static str {
        "hooks"
    }

    fn adapt(&self, cluster: &ComponentCluster, ctx: &AdapterContext<'_>) -> AdapterOutput {
        let mut output = AdapterOutput::default();
        let Some((path, doc)) = self.select_document(cluster.files(), ctx, &mut output) else {
            return output;
        };
        if let Err(e) = self.adapt_document(&path, &doc, ctx, &mut output) {
            output.fail(&path, e);
        }
        output
    }
}
