use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::{Adapter, AdapterContext, AdapterOutput};
use crate::common::{FieldValue, MetadataBlock, PLUGIN_ROOT_VAR, file_stem, frontmatter};
use crate::config::to_slash;
use crate::plugins::ComponentCluster;
use crate::security::path::canonicalize_lenient;
use crate::security::{SecureFs, safe_join};

/// Turns slash commands into flat target command files, bundling the
/// scripts they reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandAdapter;

fn script_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\$\{CLAUDE_PLUGIN_ROOT\}/([^\s"'`)\]}>;|&]+)"#)
            .expect("valid script reference regex")
    })
}

fn inline_shell_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!`([^`]+)`").expect("valid inline shell regex"))
}

/// Distinct relative paths referenced as `${CLAUDE_PLUGIN_ROOT}/<path>`, in
/// order of first appearance.
pub(crate) fn referenced_scripts(text: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for cap in script_ref_regex().captures_iter(text) {
        let rel = cap[1].trim_end_matches(['.', ',']).to_string();
        if !rel.is_empty() && !refs.contains(&rel) {
            refs.push(rel);
        }
    }
    refs
}

pub(crate) fn has_inline_shell(text: &str) -> bool {
    inline_shell_regex().is_match(text)
}

fn inline_shell_note(agent: &str) -> String {
    format!(
        "> **Note:** This command uses `!` inline shell execution, which {} does not run \
         when the command is invoked. The `!` blocks below are kept for reference only; \
         run them yourself if their output is needed.\n\n",
        agent
    )
}

/// Walk from `start` towards `stop` (or the filesystem root) looking for
/// `<dir>/<rel>`. Returns the directory it was found in and the file.
pub(crate) fn find_upward(start: &Path, rel: &str, stop: Option<&Path>) -> Option<(PathBuf, PathBuf)> {
    let start = canonicalize_lenient(start).ok()?;
    let stop = stop.and_then(|s| canonicalize_lenient(s).ok());
    let max_depth = start.components().count();

    let mut dir = Some(start.as_path());
    for _ in 0..=max_depth {
        let current = dir?;
        match safe_join(current, &[rel]) {
            Ok(candidate) if candidate.is_file() => {
                return Some((current.to_path_buf(), candidate));
            }
            Err(e) if e.is_traversal() => {
                tracing::warn!(script = rel, "Script reference escapes its search directory");
                return None;
            }
            _ => {}
        }
        if stop.as_deref() == Some(current) {
            break;
        }
        dir = current.parent();
    }
    None
}

impl CommandAdapter {
    pub fn adapt_file(
        &self,
        path: &Path,
        ctx: &AdapterContext<'_>,
        output: &mut AdapterOutput,
    ) -> crate::Result<PathBuf> {
        let source = ctx.source_fs(path)?;
        let text = source.read_to_string(path)?;
        let scripts_root = ctx.layout().command_scripts_root();
        let search_from = path.parent().unwrap_or(Path::new("."));

        let mut all_found = true;
        for rel in referenced_scripts(&text) {
            let Some((found_in, script)) =
                find_upward(search_from, &rel, ctx.placement().source_root())
            else {
                all_found = false;
                output.warn(format!(
                    "Script {} referenced by {} was not found",
                    rel,
                    path.display()
                ));
                continue;
            };
            let script_fs = SecureFs::new(&found_in)?;
            let copied = ctx.install_script(&script_fs, &script, &scripts_root.join(&rel))?;
            output.push_file(copied);
        }

        let mut adapted = if all_found && text.contains(PLUGIN_ROOT_VAR) {
            text.replace(PLUGIN_ROOT_VAR, &to_slash(&scripts_root))
        } else {
            text
        };

        let name = file_stem(path);
        if !frontmatter::has_block(&adapted) {
            let description = format!(
                "{} command from the {} plugin",
                name,
                ctx.placement().namespace().plugin()
            );
            adapted = frontmatter::wrap(&adapted, &[("description", FieldValue::text(description))]);
        }
        let body_has_shell = MetadataBlock::parse(&adapted)
            .map(|b| has_inline_shell(b.body()))
            .unwrap_or(false);
        if body_has_shell {
            let note = inline_shell_note(ctx.placement().agent().display_name());
            adapted = frontmatter::insert_after_block(&adapted, &note);
        }

        let dest = ctx.layout().commands_dir().join(format!("{}.md", name));
        let written = ctx.write(&dest, adapted)?;
        tracing::debug!(source = %path.display(), dest = %written.display(), "Adapted command");
        Ok(written)
    }
}

impl Adapter for CommandAdapter {
    fn name(&self) -> &'static str {
        "command"
    }

    fn adapt(&self, cluster: &ComponentCluster, ctx: &AdapterContext<'_>) -> AdapterOutput {
        let mut output = AdapterOutput::default();
        for path in cluster.files() {
            match self.adapt_file(path, ctx, &mut output) {
                Ok(written) => output.push_file(written),
                Err(e) => output.fail(path, e),
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlacementContext;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_referenced_scripts_distinct_in_order() {
        let text = "Run `${CLAUDE_PLUGIN_ROOT}/scripts/a.sh` then \
                    \"${CLAUDE_PLUGIN_ROOT}/bin/b.py\" and ${CLAUDE_PLUGIN_ROOT}/scripts/a.sh.";
        assert_eq!(referenced_scripts(text), ["scripts/a.sh", "bin/b.py"]);
        assert!(referenced_scripts("no refs ${CLAUDE_PLUGIN_ROOT}").is_empty());
    }

    #[test]
    fn test_inline_shell_detection() {
        assert!(has_inline_shell("Status: !`git status`"));
        assert!(!has_inline_shell("Run `git status`"));
        assert!(!has_inline_shell("Wow! `code`"));
    }

    #[test]
    fn test_find_upward_stops_at_first_match() {
        let dir = tempdir().unwrap();
        let plugin = dir.path().join("plugin");
        fs::create_dir_all(plugin.join("commands/sub")).unwrap();
        fs::create_dir_all(plugin.join("scripts")).unwrap();
        fs::write(plugin.join("scripts/run.sh"), "#!/bin/sh").unwrap();

        let (found_in, script) =
            find_upward(&plugin.join("commands/sub"), "scripts/run.sh", None).unwrap();
        assert_eq!(found_in, plugin.canonicalize().unwrap());
        assert!(script.ends_with("scripts/run.sh"));
    }

    #[test]
    fn test_find_upward_respects_stop() {
        let dir = tempdir().unwrap();
        let plugin = dir.path().join("plugin");
        fs::create_dir_all(plugin.join("commands")).unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::write(dir.path().join("scripts/run.sh"), "").unwrap();

        assert!(find_upward(&plugin.join("commands"), "scripts/run.sh", Some(&plugin)).is_none());
        assert!(find_upward(&plugin.join("commands"), "scripts/run.sh", None).is_some());
    }

    #[test]
    fn test_find_upward_rejects_escaping_reference() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("secret"), "").unwrap();
        assert!(find_upward(&dir.path().join("a/b"), "../../secret", None).is_none());
    }

    #[test]
    fn test_existing_block_left_alone_and_note_added() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::create_dir_all(src.path().join("commands")).unwrap();
        let original = "---\ndescription: Show status\nallowed-tools: Bash(git:*)\n---\nStatus: !`git status`\n";
        fs::write(src.path().join("commands/status.md"), original).unwrap();

        let placement = PlacementContext::builder()
            .target_root(target.path())
            .marketplace("m")
            .plugin("p")
            .build()
            .unwrap();
        let ctx = AdapterContext::new(&placement).unwrap();
        let cluster = ComponentCluster::Command {
            files: vec![src.path().join("commands/status.md")],
        };
        let output = CommandAdapter.adapt(&cluster, &ctx);
        assert_eq!(output.files, [PathBuf::from(".cursor/commands/m/p/status.md")]);

        let written = fs::read_to_string(target.path().join(&output.files[0])).unwrap();
        assert!(written.starts_with(
            "---\ndescription: Show status\nallowed-tools: Bash(git:*)\n---\n> **Note:**"
        ));
        assert!(written.ends_with("Status: !`git status`\n"));
    }

    #[test]
    fn test_block_synthesized_without_note_for_plain_body() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::create_dir_all(src.path().join("commands")).unwrap();
        fs::write(src.path().join("commands/hello.md"), "Say hello.\n").unwrap();

        let placement = PlacementContext::builder()
            .target_root(target.path())
            .marketplace("m")
            .plugin("greeter")
            .build()
            .unwrap();
        let ctx = AdapterContext::new(&placement).unwrap();
        let mut output = AdapterOutput::default();
        let written = CommandAdapter
            .adapt_file(&src.path().join("commands/hello.md"), &ctx, &mut output)
            .unwrap();

        let text = fs::read_to_string(target.path().join(written)).unwrap();
        let block = MetadataBlock::parse(&text).unwrap();
        assert_eq!(
            block.fields().unwrap()["description"],
            "hello command from the greeter plugin"
        );
        assert_eq!(block.body(), "Say hello.\n");
        assert!(!text.contains("**Note:**"));
    }
}
