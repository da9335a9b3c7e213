//! Companion texture lookup.
//!
//! A model's texture lives in the same directory and is found by name.
//! Comparison is case-insensitive and rules are tried in priority order;
//! within one rule the lexicographically smallest file name wins so the
//! result never depends on directory listing order.

use std::path::Path;

const TEXTURE_EXTENSION: &str = ".png";
const GENERIC_MARKER: &str = "texture";

/// Matching rules, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    /// `<model>.png`
    Exact,
    /// Starts with `<model>` and ends with `.png`.
    Prefix,
    /// Contains `<model>` and ends with `.png`.
    Contains,
    /// Contains "texture" and ends with `.png`.
    Generic,
}

impl MatchRule {
    /// All rules in priority order.
    pub const PRIORITY: [MatchRule; 4] = [
        MatchRule::Exact,
        MatchRule::Prefix,
        MatchRule::Contains,
        MatchRule::Generic,
    ];

    /// Check a file name against this rule. Both arguments must already be lowercase.
    fn matches(&self, file: &str, model: &str) -> bool {
        if !file.ends_with(TEXTURE_EXTENSION) {
            return false;
        }
        match self {
            MatchRule::Exact => file.strip_suffix(TEXTURE_EXTENSION) == Some(model),
            MatchRule::Prefix => file.starts_with(model),
            MatchRule::Contains => file.contains(model),
            MatchRule::Generic => file.contains(GENERIC_MARKER),
        }
    }
}

/// Pick the best companion texture for `model_name` among `entries`.
///
/// Returns `None` when nothing matches; the model is then exported untextured.
pub fn resolve_texture<'a, S: AsRef<str>>(entries: &'a [S], model_name: &str) -> Option<&'a str> {
    resolve_with_rule(entries, model_name).map(|(name, _)| name)
}

/// Like [`resolve_texture`], also reporting which rule matched.
pub fn resolve_with_rule<'a, S: AsRef<str>>(
    entries: &'a [S],
    model_name: &str,
) -> Option<(&'a str, MatchRule)> {
    let model = model_name.to_lowercase();

    let mut candidates: Vec<(&'a str, String)> = entries
        .iter()
        .map(|e| e.as_ref())
        .map(|name| (name, name.to_lowercase()))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(b.0));

    MatchRule::PRIORITY.iter().find_map(|rule| {
        candidates
            .iter()
            .find(|(_, lower)| rule.matches(lower, &model))
            .map(|(name, _)| (*name, *rule))
    })
}

/// List the plain file names in a directory.
pub fn list_file_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
