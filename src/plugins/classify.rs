use std::path::{Path, PathBuf};

use crate::common::{has_segment, is_hooks_document, is_markdown, is_skill_file};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Skill,
    Command,
    HookManifest,
    Unsupported,
    Document,
    Unclassified,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Skill => "skill",
            ComponentKind::Command => "command",
            ComponentKind::HookManifest => "hooks",
            ComponentKind::Unsupported => "unsupported",
            ComponentKind::Document => "document",
            ComponentKind::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of plugin files handled together by one adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentCluster {
    /// `files` holds the anchor first, then its assets in input order.
    Skill { anchor: PathBuf, files: Vec<PathBuf> },
    Command { files: Vec<PathBuf> },
    HookManifest { files: Vec<PathBuf> },
    /// Subagent definitions, dropped without translation.
    Unsupported { files: Vec<PathBuf> },
    Document { files: Vec<PathBuf> },
    Unclassified { files: Vec<PathBuf> },
}

impl ComponentCluster {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentCluster::Skill { .. } => ComponentKind::Skill,
            ComponentCluster::Command { .. } => ComponentKind::Command,
            ComponentCluster::HookManifest { .. } => ComponentKind::HookManifest,
            ComponentCluster::Unsupported { .. } => ComponentKind::Unsupported,
            ComponentCluster::Document { .. } => ComponentKind::Document,
            ComponentCluster::Unclassified { .. } => ComponentKind::Unclassified,
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        match self {
            ComponentCluster::Skill { files, .. }
            | ComponentCluster::Command { files }
            | ComponentCluster::HookManifest { files }
            | ComponentCluster::Unsupported { files }
            | ComponentCluster::Document { files }
            | ComponentCluster::Unclassified { files } => files,
        }
    }
}

/// Remove and return every file in `pool` matching `pred`, keeping order.
fn take_matching(pool: &mut Vec<PathBuf>, pred: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let (taken, rest): (Vec<_>, Vec<_>) = pool.drain(..).partition(|p| pred(p));
    *pool = rest;
    taken
}

/// Partition `files` into clusters in fixed priority order. Every input
/// path ends up in exactly one cluster; empty clusters are omitted.
pub fn classify(files: &[PathBuf]) -> Vec<ComponentCluster> {
    let mut pool: Vec<PathBuf> = files.to_vec();
    let mut clusters = Vec::new();

    let anchors: Vec<PathBuf> = files.iter().filter(|f| is_skill_file(f)).cloned().collect();
    for anchor in anchors {
        let Some(pos) = pool.iter().position(|p| *p == anchor) else {
            continue;
        };
        let anchor = pool.remove(pos);
        let root = anchor.parent().filter(|p| !p.as_os_str().is_empty());
        let mut members = vec![anchor.clone()];
        if let Some(root) = root {
            members.extend(take_matching(&mut pool, |p| p.starts_with(root)));
        }
        clusters.push(ComponentCluster::Skill {
            anchor,
            files: members,
        });
    }

    let commands = take_matching(&mut pool, |p| has_segment(p, "commands"));
    if !commands.is_empty() {
        clusters.push(ComponentCluster::Command { files: commands });
    }
    let hooks = take_matching(&mut pool, is_hooks_document);
    if !hooks.is_empty() {
        clusters.push(ComponentCluster::HookManifest { files: hooks });
    }
    let agents = take_matching(&mut pool, |p| has_segment(p, "agents"));
    if !agents.is_empty() {
        clusters.push(ComponentCluster::Unsupported { files: agents });
    }
    let documents = take_matching(&mut pool, is_markdown);
    if !documents.is_empty() {
        clusters.push(ComponentCluster::Document { files: documents });
    }

    if !pool.is_empty() {
        clusters.push(ComponentCluster::Unclassified { files: pool });
    }
    clusters
}
