use std::path::{Path, PathBuf};

use super::document::to_rule;
use super::{Adapter, AdapterContext, AdapterOutput, component_type};
use crate::common::{FieldValue, frontmatter, is_skill_file};
use crate::config::to_slash;
use crate::plugins::ComponentCluster;

/// Turns a skill directory into a rule plus executable assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkillAdapter;

fn scripts_hint(scripts_dir: &Path) -> String {
    format!("Scripts located at: {}/", to_slash(scripts_dir))
}

/// Adapt the anchor text as a rule and record where its assets live.
pub(crate) fn adapt_anchor(
    text: &str,
    skill_name: &str,
    hint: &str,
    ctx: &AdapterContext<'_>,
) -> String {
    let agent = ctx.placement().agent();
    if frontmatter::has_block(text) {
        let ruled = to_rule(text, agent, "");
        return frontmatter::append_to_field(&ruled, "description", hint).unwrap_or_else(|| {
            frontmatter::ensure_keys(&ruled, &[("description", FieldValue::text(hint))])
        });
    }
    to_rule(
        text,
        agent,
        &format!("Skill {} imported from SKILL.md. {}", skill_name, hint),
    )
}

impl SkillAdapter {
    fn adapt_skill(
        &self,
        anchor: &Path,
        files: &[PathBuf],
        ctx: &AdapterContext<'_>,
        output: &mut AdapterOutput,
    ) {
        let skill_root = anchor.parent().unwrap_or(Path::new(""));
        let skill_name = skill_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "skill".to_string());
        let scripts_dir = ctx.layout().skill_scripts_root().join(&skill_name);
        let hint = scripts_hint(&scripts_dir);

        let agent = ctx.placement().agent();
        let dest = ctx
            .layout()
            .rules_dir()
            .join(component_type(anchor))
            .join(format!("{}.{}", skill_name, agent.rule_extension()));

        let anchor_result = ctx
            .source_fs(anchor)
            .map_err(crate::Error::from)
            .and_then(|source| Ok(source.read_to_string(anchor)?))
            .and_then(|text| ctx.write(&dest, adapt_anchor(&text, &skill_name, &hint, ctx)));
        match anchor_result {
            Ok(written) => output.push_file(written),
            Err(e) => output.fail(anchor, e),
        }

        for file in files.iter().filter(|f| f.as_path() != anchor) {
            let Ok(rel) = file.strip_prefix(skill_root) else {
                output.warn(format!(
                    "Skill asset {} is outside skill directory {}",
                    file.display(),
                    skill_root.display()
                ));
                continue;
            };
            let result = ctx
                .source_fs(file)
                .map_err(crate::Error::from)
                .and_then(|source| ctx.install_script(&source, file, &scripts_dir.join(rel)));
            match result {
                Ok(copied) => output.push_file(copied),
                Err(e) => output.fail(file, e),
            }
        }

        tracing::debug!(skill = %skill_name, files = output.files.len(), "Adapted skill");
    }
}

impl Adapter for SkillAdapter {
    fn name(&self) -> &'static str {
        "skill"
    }

    fn adapt(&self, cluster: &ComponentCluster, ctx: &AdapterContext<'_>) -> AdapterOutput {
        let mut output = AdapterOutput::default();
        let files = cluster.files();
        let Some(anchor) = files.iter().find(|f| is_skill_file(f)) else {
            tracing::debug!("Skill cluster without anchor, nothing to adapt");
            return output;
        };
        self.adapt_skill(anchor, files, ctx, &mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MetadataBlock;
    use crate::config::PlacementContext;
    use std::fs;
    use tempfile::tempdir;

    fn placement(target: &Path) -> PlacementContext {
        PlacementContext::builder()
            .target_root(target)
            .marketplace("m")
            .plugin("p")
            .build()
            .unwrap()
    }

    #[test]
    fn test_hint_appended_to_existing_description() {
        let target = tempdir().unwrap();
        let placement = placement(target.path());
        let ctx = AdapterContext::new(&placement).unwrap();

        let out = adapt_anchor(
            "---\nname: pdf\ndescription: Fill PDF forms\n---\nBody\n",
            "pdf",
            "Scripts located at: .cursor/scripts/skills/m/p/pdf/",
            &ctx,
        );
        let fields = MetadataBlock::parse(&out).unwrap().fields().unwrap();
        assert_eq!(
            fields["description"],
            "Fill PDF forms. Scripts located at: .cursor/scripts/skills/m/p/pdf/"
        );
        assert_eq!(fields["alwaysApply"], serde_json::json!(false));
    }

    #[test]
    fn test_hint_added_when_block_lacks_description() {
        let target = tempdir().unwrap();
        let placement = placement(target.path());
        let ctx = AdapterContext::new(&placement).unwrap();

        let out = adapt_anchor("---\nname: pdf\n---\nBody\n", "pdf", "Scripts located at: x/", &ctx);
        let fields = MetadataBlock::parse(&out).unwrap().fields().unwrap();
        assert_eq!(fields["description"], "Scripts located at: x/");
    }

    #[test]
    fn test_hint_embedded_in_synthesized_block() {
        let target = tempdir().unwrap();
        let placement = placement(target.path());
        let ctx = AdapterContext::new(&placement).unwrap();

        let out = adapt_anchor("# PDF\n", "pdf", "Scripts located at: x/", &ctx);
        let block = MetadataBlock::parse(&out).unwrap();
        let description = block.fields().unwrap()["description"].clone();
        assert!(description.as_str().unwrap().ends_with("Scripts located at: x/"));
        assert_eq!(block.body(), "# PDF\n");
    }

    #[test]
    fn test_cluster_without_anchor_produces_nothing() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        fs::write(src.path().join("run.sh"), "echo").unwrap();
        let placement = placement(target.path());
        let ctx = AdapterContext::new(&placement).unwrap();

        let cluster = ComponentCluster::Skill {
            anchor: src.path().join("SKILL.md"),
            files: vec![src.path().join("run.sh")],
        };
        let output = SkillAdapter.adapt(&cluster, &ctx);
        assert!(output.files.is_empty());
        assert!(output.failures.is_empty());
    }

    #[test]
    fn test_lowercase_anchor_is_recognized() {
        let src = tempdir().unwrap();
        let target = tempdir().unwrap();
        let skill = src.path().join("tidy");
        fs::create_dir_all(&skill).unwrap();
        fs::write(skill.join("skill.md"), "Tidy things").unwrap();

        let placement = placement(target.path());
        let ctx = AdapterContext::new(&placement).unwrap();
        let cluster = ComponentCluster::Skill {
            anchor: skill.join("skill.md"),
            files: vec![skill.join("skill.md")],
        };
        let output = SkillAdapter.adapt(&cluster, &ctx);
        assert_eq!(output.files, [PathBuf::from(".cursor/rules/m/p/misc/tidy.mdc")]);
    }
}
