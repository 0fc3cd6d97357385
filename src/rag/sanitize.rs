//! Strips retrieval metadata that leaks into model answers

use std::sync::LazyLock;

use regex::Regex;

static SCORE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)score:\s*\d+\.\d+").ok());

static BRACKETED_NODE_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\[\s*node_id\s*:\s*[^\]]+\]").ok());

static PARENTHESIZED_NODE_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*node_id\s*:\s*[^\)]+\)").ok());

static SPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r" {2,}").ok());

static ANNOTATION_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(Note:|Validation:)").ok());

fn replace(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

fn sanitize_once(text: &str) -> String {
    let text = replace(&SCORE, text, "");
    let text = replace(&BRACKETED_NODE_ID, &text, "");
    let text = replace(&PARENTHESIZED_NODE_ID, &text, "");
    let text = replace(&SPACE_RUN, &text, " ");

    let annotation = ANNOTATION_LINE.as_ref();
    text.lines()
        .filter(|line| !annotation.is_some_and(|re| re.is_match(line)))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Remove score and node id leaks, collapse space runs, drop `Note:` and
/// `Validation:` lines and trim.
///
/// Applied until nothing changes, so sanitizing twice equals sanitizing once.
#[must_use]
pub fn sanitize_answer(text: &str) -> String {
    let mut current = sanitize_once(text);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
