use std::path::Path;

use super::{Adapter, AdapterContext, AdapterOutput, component_type};
use crate::common::{FieldValue, file_stem, frontmatter};
use crate::config::TargetAgent;
use crate::plugins::ComponentCluster;

/// Turns instruction documents into target rule files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentAdapter;

/// Ensure the agent's rule keys on an existing block, or synthesize a block
/// with `description` when there is none.
pub(crate) fn to_rule(text: &str, agent: &TargetAgent, description: &str) -> String {
    let defaults = agent.rule_defaults();
    if frontmatter::has_block(text) {
        return frontmatter::ensure_keys(text, &defaults);
    }
    let mut fields = vec![("description", FieldValue::text(description))];
    fields.extend(defaults);
    frontmatter::wrap(text, &fields)
}

pub(crate) fn imported_from(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Imported from {}", name)
}

impl DocumentAdapter {
    pub fn adapt_file(&self, path: &Path, ctx: &AdapterContext<'_>) -> crate::Result<std::path::PathBuf> {
        let source = ctx.source_fs(path)?;
        let text = source.read_to_string(path)?;
        let agent = ctx.placement().agent();
        let adapted = to_rule(&text, agent, &imported_from(path));

        let dest = ctx
            .layout()
            .rules_dir()
            .join(component_type(path))
            .join(format!("{}.{}", file_stem(path), agent.rule_extension()));
        let written = ctx.write(&dest, adapted)?;
        tracing::debug!(source = %path.display(), dest = %written.display(), "Adapted document");
        Ok(written)
    }
}

impl Adapter for DocumentAdapter {
    fn name(&self) -> &'static str {
        "document"
    }

    fn adapt(&self, cluster: &ComponentCluster, ctx: &AdapterContext<'_>) -> AdapterOutput {
        let mut output = AdapterOutput::default();
        for path in cluster.files() {
            match self.adapt_file(path, ctx) {
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
    use crate::common::MetadataBlock;
    use crate::config::PlacementContext;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn placement(target: &Path, agent: TargetAgent) -> PlacementContext {
        PlacementContext::builder()
            .target_root(target)
            .marketplace("m")
            .plugin("p")
            .agent(agent)
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_rule_adds_defaults_to_existing_block() {
        let out = to_rule(
            "---\ndescription: Review code\n---\nBody\n",
            &TargetAgent::Cursor,
            "unused",
        );
        let block = MetadataBlock::parse(&out).unwrap();
        let fields = block.fields().unwrap();
        assert_eq!(fields["description"], "Review code");
        assert_eq!(fields["globs"], serde_json::json!([]));
        assert_eq!(fields["alwaysApply"], serde_json::json!(false));
        assert_eq!(block.body(), "Body\n");
    }

    #[test]
    fn test_to_rule_keeps_existing_values() {
        let text = "---\nglobs: [\"*.rs\"]\nalwaysApply: true\n---\nBody";
        assert_eq!(to_rule(text, &TargetAgent::Cursor, "x"), text);
    }

    #[test]
    fn test_to_rule_synthesizes_block() {
        let out = to_rule("# Guide\n", &TargetAgent::Cursor, "Imported from guide.md");
        let block = MetadataBlock::parse(&out).unwrap();
        let fields = block.fields().unwrap();
        assert_eq!(fields["description"], "Imported from guide.md");
        assert_eq!(fields["alwaysApply"], serde_json::json!(false));
        assert_eq!(block.body(), "# Guide\n");
    }

    #[test]
    fn test_adapt_cluster_places_by_component_type() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::create_dir_all(src.path().join("docs")).unwrap();
        fs::create_dir_all(src.path().join("skills")).unwrap();
        fs::write(src.path().join("docs/style.md"), "Use tabs.\n").unwrap();
        fs::write(src.path().join("skills/notes.md"), "---\nname: n\n---\nx").unwrap();

        let placement = placement(target.path(), TargetAgent::Cursor);
        let ctx = AdapterContext::new(&placement).unwrap();
        let cluster = ComponentCluster::Document {
            files: vec![
                src.path().join("docs/style.md"),
                src.path().join("skills/notes.md"),
            ],
        };
        let output = DocumentAdapter.adapt(&cluster, &ctx);

        assert!(output.failures.is_empty());
        assert_eq!(
            output.files,
            [
                PathBuf::from(".cursor/rules/m/p/misc/style.mdc"),
                PathBuf::from(".cursor/rules/m/p/skills/notes.mdc"),
            ]
        );
        let written = fs::read_to_string(target.path().join(&output.files[0])).unwrap();
        assert!(written.contains("Imported from style.md"));
    }

    #[test]
    fn test_other_agent_uses_md_and_no_defaults() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::write(src.path().join("a.md"), "---\nname: a\n---\nx").unwrap();

        let placement = placement(target.path(), TargetAgent::Other("codex".into()));
        let ctx = AdapterContext::new(&placement).unwrap();
        let written = DocumentAdapter
            .adapt_file(&src.path().join("a.md"), &ctx)
            .unwrap();
        assert_eq!(written, PathBuf::from(".codex/rules/m/p/misc/a.md"));
        assert_eq!(
            fs::read_to_string(target.path().join(written)).unwrap(),
            "---\nname: a\n---\nx"
        );
    }

    #[test]
    fn test_missing_file_is_recorded_and_rest_continue() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::write(src.path().join("ok.md"), "ok").unwrap();

        let placement = placement(target.path(), TargetAgent::Cursor);
        let ctx = AdapterContext::new(&placement).unwrap();
        let cluster = ComponentCluster::Document {
            files: vec![src.path().join("gone.md"), src.path().join("ok.md")],
        };
        let output = DocumentAdapter.adapt(&cluster, &ctx);
        assert_eq!(output.failures.len(), 1);
        assert!(output.failures[0].path.ends_with("gone.md"));
        assert_eq!(output.files.len(), 1);
    }
}
