//! Prompt construction for itinerary queries

use std::collections::HashMap;

use crate::models::ChatMessage;
use crate::models::GraphFact;
use crate::models::Match;
use crate::models::Preferences;
use crate::rag::context::search_summary;

/// Vector matches listed verbatim in the user turn
pub const PROMPT_MATCHES: usize = 10;

/// Graph facts listed verbatim in the user turn
pub const PROMPT_FACTS: usize = 15;

/// Template text with `{{variable}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables; unknown placeholders are kept
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

const ITINERARY_REQUEST: &str =
    "Provide exactly {{trip_length}}-day itineraries with timings and local tips.";

/// Named persona and format instructions for the system turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateKind {
    #[default]
    Concise,
    ChainOfThought,
}

impl TemplateKind {
    /// Look up a template by name; unknown or missing names use `concise`
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("chain_of_thought") => Self::ChainOfThought,
            _ => Self::Concise,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::ChainOfThought => "chain_of_thought",
        }
    }

    #[must_use]
    pub const fn system(self) -> &'static str {
        match self {
            Self::Concise => "You are a helpful, concise travel assistant.",
            Self::ChainOfThought => {
                "You are a helpful travel assistant who explains reasoning clearly."
            }
        }
    }

    /// Format instructions appended to the persona
    #[must_use]
    pub fn suffix(self) -> PromptTemplate {
        let tail = match self {
            Self::Concise => " Be concise and factual.",
            Self::ChainOfThought => {
                " After the itinerary, include a short 'Reasoning' section that lists the key \
                 assumptions and steps used to produce the plan (3-5 bullet points). Keep the \
                 reasoning concise and factual."
            }
        };
        PromptTemplate::new(format!("{ITINERARY_REQUEST}{tail}"))
    }

    /// Full system turn for the given trip length
    #[must_use]
    pub fn system_prompt(self, trip_length: u32) -> String {
        let mut values = HashMap::new();
        values.insert("trip_length".to_string(), trip_length.to_string());
        format!("{} {}", self.system(), self.suffix().render(&values))
    }
}

/// Requested itinerary length: 4 days when the query mentions a 4, else 3
#[must_use]
pub fn trip_length(query: &str) -> u32 {
    if query.contains('4') {
        4
    } else {
        3
    }
}

fn match_line(m: &Match) -> String {
    format!(
        "- id: {}, name: {}, type: {}, score: {}",
        m.id, m.metadata.name, m.metadata.entity_type, m.score
    )
}

fn fact_line(fact: &GraphFact) -> String {
    format!(
        "- ({}) -[{}]-> ({}) {}: {}",
        fact.source.as_deref().unwrap_or("match"),
        fact.rel,
        fact.target_id,
        fact.target_name,
        fact.target_desc
    )
}

/// Build the two-turn prompt (system, user) for a query
#[must_use]
pub fn build_prompt(
    query: &str,
    matches: &[Match],
    facts: &[GraphFact],
    preferences: &Preferences,
) -> Vec<ChatMessage> {
    let kind = TemplateKind::from_name(preferences.template.as_deref());
    let system = kind.system_prompt(trip_length(query));

    let vec_context: Vec<String> = matches.iter().take(PROMPT_MATCHES).map(match_line).collect();
    let graph_context: Vec<String> = facts.iter().take(PROMPT_FACTS).map(fact_line).collect();
    let summary = search_summary(matches, facts);

    let mut user = String::new();
    user.push_str(&format!("User query: {query}\n\n"));
    user.push_str(&format!("Preferences: {preferences}\n\n"));
    user.push_str(&format!("Summary:\n{summary}\n\n"));
    user.push_str(&format!(
        "Top semantic matches:\n{}\n\n",
        vec_context.join("\n")
    ));
    user.push_str(&format!("Graph facts:\n{}\n\n", graph_context.join("\n")));
    user.push_str("Please produce the requested output.");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
