//! Metadata block (YAML frontmatter) detection and patching.
//!
//! A block exists only when the very first line is the `---` sentinel and a
//! second sentinel line follows. Anything after the closing sentinel is body
//! text and is carried through byte for byte. Detection is anchored to the
//! start of the document, so a `---` rule deeper in the body never counts.

use std::collections::BTreeMap;
use std::ops::Range;

pub const SENTINEL: &str = "---";

/// Value written into a metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Emitted verbatim, e.g. `false`.
    Raw(String),
    /// String scalar, quoted only when plain YAML would misread it.
    Text(String),
    /// Flow sequence of string scalars.
    List(Vec<String>),
}

impl FieldValue {
    pub fn raw(value: impl Into<String>) -> Self {
        Self::Raw(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    fn render(&self) -> String {
        match self {
            FieldValue::Raw(v) => v.clone(),
            FieldValue::Text(v) => render_scalar(v),
            FieldValue::List(items) => {
                let items: Vec<String> = items.iter().map(|i| render_scalar(i)).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

/// Render a string as a single-line YAML scalar, quoted only when plain YAML
/// would misread it. Multi-line output from the emitter is replaced by a
/// double-quoted scalar so the value stays on its key's line.
pub fn render_scalar(value: &str) -> String {
    match serde_yaml_bw::to_string(value) {
        Ok(yaml) if !yaml.trim_end().contains('\n') => yaml.trim_end().to_string(),
        _ => serde_json::Value::String(value.to_string()).to_string(),
    }
}

fn is_sentinel(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == SENTINEL
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") { "\r\n" } else { "\n" }
}

fn top_level_key(line: &str) -> Option<&str> {
    if line.starts_with([' ', '\t', '#', '-']) {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    let key = key.trim().trim_matches(['"', '\'']);
    (!key.is_empty()).then_some(key)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Outside,
    InBlock,
}

/// A parsed view over a document that starts with a metadata block.
#[derive(Debug, Clone)]
pub struct MetadataBlock<'a> {
    opening: &'a str,
    lines: Vec<&'a str>,
    closing: &'a str,
    body: &'a str,
}

impl<'a> MetadataBlock<'a> {
    pub fn parse(text: &'a str) -> Option<Self> {
        let mut state = ParseState::Outside;
        let mut opening = "";
        let mut lines = Vec::new();
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            offset += line.len();
            match state {
                ParseState::Outside => {
                    if !is_sentinel(line) {
                        return None;
                    }
                    opening = line;
                    state = ParseState::InBlock;
                }
                ParseState::InBlock => {
                    if is_sentinel(line) {
                        return Some(Self {
                            opening,
                            lines,
                            closing: line,
                            body: &text[offset..],
                        });
                    }
                    lines.push(line);
                }
            }
        }

        None
    }

    pub fn body(&self) -> &'a str {
        self.body
    }

    /// Top-level keys in declaration order.
    pub fn keys(&self) -> Vec<&'a str> {
        self.lines.iter().filter_map(|l| top_level_key(l)).collect()
    }

    /// Decode the block as YAML.
    pub fn fields(&self) -> crate::Result<BTreeMap<String, serde_json::Value>> {
        let inner: String = self.lines.concat();
        if inner.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml_bw::from_str(&inner)
            .map_err(|e| crate::Error::Parse(format!("Failed to parse frontmatter: {}", e)))
    }

    fn newline(&self) -> &'static str {
        line_ending(self.opening)
    }

    fn render(&self, lines: &[String]) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(self.opening);
        for line in lines {
            out.push_str(line);
        }
        out.push_str(self.closing);
        out.push_str(self.body);
        out
    }

    fn owned_lines(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.to_string()).collect()
    }
}

pub fn has_block(text: &str) -> bool {
    MetadataBlock::parse(text).is_some()
}

/// Insert every missing key right after the opening sentinel. Existing keys
/// are left exactly as they are. Documents without a block are returned as is.
pub fn ensure_keys(text: &str, defaults: &[(&str, FieldValue)]) -> String {
    let Some(block) = MetadataBlock::parse(text) else {
        return text.to_string();
    };

    let existing = block.keys();
    let nl = block.newline();
    let mut inserted: Vec<String> = defaults
        .iter()
        .filter(|(key, _)| !existing.contains(key))
        .map(|(key, value)| format!("{}: {}{}", key, value.render(), nl))
        .collect();

    if inserted.is_empty() {
        return text.to_string();
    }

    inserted.extend(block.owned_lines());
    block.render(&inserted)
}

/// Prepend a block built from `fields`. Documents that already have a block
/// are returned as is.
pub fn wrap(text: &str, fields: &[(&str, FieldValue)]) -> String {
    if has_block(text) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 128);
    out.push_str(SENTINEL);
    out.push('\n');
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&value.render());
        out.push('\n');
    }
    out.push_str(SENTINEL);
    out.push('\n');
    out.push_str(text);
    out
}

/// Lines after `idx` that continue its value: indented or blank, without
/// trailing blank lines.
fn continuation(lines: &[String], idx: usize) -> Range<usize> {
    let start = idx + 1;
    let mut end = start
        + lines[start..]
            .iter()
            .take_while(|l| l.starts_with([' ', '\t']) || l.trim().is_empty())
            .count();
    while end > start && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    start..end
}

/// Decode the string value of `key` from a `key: value` YAML fragment.
fn decode_value(fragment: &str, key: &str) -> Option<String> {
    let map: BTreeMap<String, serde_json::Value> = serde_yaml_bw::from_str(fragment).ok()?;
    match map.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => Some(String::new()),
        other => Some(other.to_string()),
    }
}

fn join_sentence(existing: &str, suffix: &str) -> String {
    let existing = existing.trim();
    if existing.is_empty() {
        suffix.to_string()
    } else if existing.ends_with(['.', '!', '?']) {
        format!("{} {}", existing, suffix)
    } else {
        format!("{}. {}", existing, suffix)
    }
}

/// Append `suffix` to the string value of top-level `key`.
///
/// Returns `None` when the document has no block or the key is absent.
pub fn append_to_field(text: &str, key: &str, suffix: &str) -> Option<String> {
    let block = MetadataBlock::parse(text)?;
    let mut lines = block.owned_lines();
    let idx = lines
        .iter()
        .position(|l| top_level_key(l) == Some(key))?;

    let nl = line_ending(&lines[idx]);
    let line = lines[idx].trim_end_matches(['\n', '\r']).to_string();
    let (raw_key, raw_value) = line.split_once(':')?;
    let value = raw_value.trim();
    let span = continuation(&lines, idx);

    if value.starts_with('|') || value.starts_with('>') {
        if span.is_empty() {
            lines[idx] = format!("{}: {}{}", raw_key, render_scalar(suffix), nl);
            return Some(block.render(&lines));
        }
        let indent: String = lines[span.start]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        lines.insert(span.end, format!("{}{}{}", indent, suffix, nl));
        return Some(block.render(&lines));
    }

    let fragment = lines[idx..span.end].concat();
    let current = decode_value(&fragment, key).unwrap_or_else(|| value.to_string());
    let updated = join_sentence(&current, suffix);
    lines.drain(span);
    lines[idx] = format!("{}: {}{}", raw_key, render_scalar(&updated), nl);
    Some(block.render(&lines))
}

/// Place `insertion` between the block and the body, or at the very top
/// when there is no block.
pub fn insert_after_block(text: &str, insertion: &str) -> String {
    match MetadataBlock::parse(text) {
        Some(block) => {
            let head_len = text.len() - block.body().len();
            format!("{}{}{}", &text[..head_len], insertion, block.body())
        }
        None => format!("{}{}", insertion, text),
    }
}
