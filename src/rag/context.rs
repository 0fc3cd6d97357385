//! Context merging: a ranked, bounded summary of vector matches and graph facts

use crate::models::GraphFact;
use crate::models::Match;
use crate::text::truncate_chars;

/// Merges vector matches and graph facts into the prompt summary section
#[derive(Debug, Clone, Copy)]
pub struct ContextMerger {
    max_matches: usize,
    max_facts: usize,
    fact_desc_chars: usize,
}

impl ContextMerger {
    /// Create a new context merger
    #[must_use]
    pub const fn new(max_matches: usize, max_facts: usize, fact_desc_chars: usize) -> Self {
        Self {
            max_matches,
            max_facts,
            fact_desc_chars,
        }
    }

    /// Top matches by descending score (stable for ties)
    #[must_use]
    pub fn top_matches<'a>(&self, matches: &'a [Match]) -> Vec<&'a Match> {
        let mut ranked: Vec<&Match> = matches.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.max_matches);
        ranked
    }

    fn format_match(m: &Match) -> String {
        let meta = &m.metadata;
        let name = if meta.name.is_empty() { "Unknown" } else { &meta.name };
        let kind = if meta.entity_type.is_empty() {
            "Unknown"
        } else {
            &meta.entity_type
        };
        format!(
            "- {}: {} (tags: {}, score: {:.2})",
            name,
            kind,
            meta.tags.join(", "),
            m.score
        )
    }

    fn format_fact(&self, fact: &GraphFact) -> String {
        format!(
            "- {}: {}...",
            fact.target_name,
            truncate_chars(&fact.target_desc, self.fact_desc_chars)
        )
    }

    /// Build the summary: best matches first, then graph facts in fetch order
    #[must_use]
    pub fn summarize(&self, matches: &[Match], facts: &[GraphFact]) -> String {
        let vec_snippets: Vec<String> = self
            .top_matches(matches)
            .into_iter()
            .map(Self::format_match)
            .collect();

        let graph_snippets: Vec<String> = facts
            .iter()
            .take(self.max_facts)
            .map(|fact| self.format_fact(fact))
            .collect();

        format!(
            "Prioritized Vector matches:\n{}\n\nPrioritized Graph facts:\n{}",
            vec_snippets.join("\n"),
            graph_snippets.join("\n")
        )
    }
}

impl Default for ContextMerger {
    fn default() -> Self {
        Self::new(5, 7, 120)
    }
}

/// Summary with the default bounds (5 matches, 7 facts, 120-char descriptions)
#[must_use]
pub fn search_summary(matches: &[Match], facts: &[GraphFact]) -> String {
    ContextMerger::default().summarize(matches, facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchMetadata;

    fn m(id: &str, score: f32, tags: &[&str]) -> Match {
        Match::new(
            id,
            score,
            MatchMetadata {
                name: format!("Name {id}"),
                entity_type: "City".to_string(),
                tags: tags.iter().map(ToString::to_string).collect(),
                city: String::new(),
            },
        )
    }

    fn fact(id: &str, desc: &str) -> GraphFact {
        GraphFact {
            source: None,
            rel: "NEAR".to_string(),
            target_id: id.to_string(),
            target_name: format!("Target {id}"),
            target_desc: desc.to_string(),
            labels: vec!["Attraction".to_string()],
        }
    }

    #[test]
    fn test_summary_ranks_and_bounds_matches() {
        let matches: Vec<_> = (0..8)
            .map(|i| m(&format!("m{i}"), i as f32 / 10.0, &["beach"]))
            .collect();
        let summary = search_summary(&matches, &[]);

        let lines: Vec<_> = summary
            .lines()
            .filter(|l| l.starts_with("- "))
            .collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "- Name m7: City (tags: beach, score: 0.70)");
        assert_eq!(lines[4], "- Name m3: City (tags: beach, score: 0.30)");
    }

    #[test]
    fn test_summary_bounds_facts_in_fetch_order() {
        let facts: Vec<_> = (0..10).map(|i| fact(&format!("f{i}"), "x")).collect();
        let summary = search_summary(&[], &facts);

        let fact_lines: Vec<_> = summary
            .split("Prioritized Graph facts:\n")
            .nth(1)
            .unwrap()
            .lines()
            .collect();
        assert_eq!(fact_lines.len(), 7);
        assert_eq!(fact_lines[0], "- Target f0: x...");
        assert_eq!(fact_lines[6], "- Target f6: x...");
    }

    #[test]
    fn test_fact_description_truncated() {
        let long = "a".repeat(300);
        let summary = search_summary(&[], &[fact("f", &long)]);
        let expected = format!("- Target f: {}...", "a".repeat(120));
        assert!(summary.ends_with(&expected));
    }

    #[test]
    fn test_empty_inputs_give_empty_sections() {
        let summary = search_summary(&[], &[]);
        assert_eq!(
            summary,
            "Prioritized Vector matches:\n\n\nPrioritized Graph facts:\n"
        );
    }

    #[test]
    fn test_missing_metadata_renders_unknown() {
        let summary = search_summary(&[Match::new("x", 0.5, MatchMetadata::default())], &[]);
        assert!(summary.contains("- Unknown: Unknown (tags: , score: 0.50)"));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let matches = vec![m("first", 0.5, &[]), m("second", 0.5, &[])];
        let merger = ContextMerger::default();
        let top = merger.top_matches(&matches);
        assert_eq!(top[0].id, "first");
        assert_eq!(top[1].id, "second");
    }
}
