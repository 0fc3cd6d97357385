//! Rewrites `[id]` citation placeholders into readable entity descriptions

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::models::GraphFact;
use crate::models::Match;

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[\s*([^\]]+)\s*\]").ok());

static NODE_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?:node[_ ]?id|nodeid|id)\s*:\s*)?(?P<id>[A-Za-z0-9_-]+)").ok()
});

/// Keywords surfaced from graph fact descriptions
pub const FACT_KEYWORDS: [&str; 7] = [
    "romantic", "beach", "culture", "heritage", "food", "nature", "mountain",
];

fn placeholder_id(raw: &str) -> &str {
    NODE_ID
        .as_ref()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.name("id"))
        .map_or(raw, |m| m.as_str())
}

fn describe_match(m: &Match) -> String {
    let kind = if m.metadata.entity_type.is_empty() {
        "Entity"
    } else {
        &m.metadata.entity_type
    };
    if m.metadata.tags.is_empty() {
        kind.to_string()
    } else {
        format!("{} ({})", kind, m.metadata.tags.join(", "))
    }
}

fn describe_fact(fact: &GraphFact) -> String {
    let label = fact
        .labels
        .first()
        .filter(|l| !l.is_empty())
        .map_or("Entity", String::as_str);
    let desc = fact.target_desc.to_lowercase();
    let found: Vec<&str> = FACT_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| desc.contains(kw))
        .collect();
    if found.is_empty() {
        label.to_string()
    } else {
        format!("{} ({})", label, found.join(", "))
    }
}

/// Replace each bracketed placeholder resolving to a known match or fact.
///
/// Matches are consulted before facts; when ids repeat, the later entry
/// wins. Unresolved placeholders are left untouched.
#[must_use]
pub fn expand_citations(text: &str, matches: &[Match], facts: &[GraphFact]) -> String {
    let Some(placeholder) = PLACEHOLDER.as_ref() else {
        return text.to_string();
    };

    let matches_by_id: HashMap<&str, &Match> = matches
        .iter()
        .filter(|m| !m.id.is_empty())
        .map(|m| (m.id.as_str(), m))
        .collect();
    let facts_by_id: HashMap<&str, &GraphFact> = facts
        .iter()
        .filter(|f| !f.target_id.is_empty())
        .map(|f| (f.target_id.as_str(), f))
        .collect();

    placeholder
        .replace_all(text, |caps: &Captures| {
            let raw = caps.get(1).map_or("", |m| m.as_str()).trim();
            let id = placeholder_id(raw);

            if let Some(m) = matches_by_id.get(id) {
                describe_match(m)
            } else if let Some(fact) = facts_by_id.get(id) {
                describe_fact(fact)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
