//! Complete hybrid pipeline: Embed -> Match -> Expand -> Prompt -> Generate -> Post-process

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::graph::GraphStore;
use crate::graph::Neo4jGraph;
use crate::llm::ChatCompleter;
use crate::llm::LlmService;
use crate::models::GraphFact;
use crate::models::Match;
use crate::models::Preferences;
use crate::rag::citations::expand_citations;
use crate::rag::prompts::build_prompt;
use crate::rag::prompts::trip_length;
use crate::rag::sanitize::sanitize_answer;
use crate::rag::validation::retry_prompt;
use crate::rag::validation::validate_response;
use crate::rag::validation::Validation;
use crate::vector::PineconeIndex;
use crate::vector::VectorIndex;

/// Tunables for one pipeline instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub max_tokens: u32,
    pub retry_max_tokens: u32,
    pub default_template: String,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k(),
            max_tokens: config.pipeline.max_tokens,
            retry_max_tokens: config.pipeline.retry_max_tokens,
            default_template: config.pipeline.default_template.clone(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Context retrieved for a query before generation
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub matches: Vec<Match>,
    pub facts: Vec<GraphFact>,
    /// Graph expansion failed and only vector context is available
    pub graph_degraded: bool,
}

/// Hybrid retrieval and generation service
pub struct HybridPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    graph: Arc<dyn GraphStore>,
    llm: Arc<dyn ChatCompleter>,
    options: PipelineOptions,
}

impl HybridPipeline {
    /// Create from existing collaborators
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        graph: Arc<dyn GraphStore>,
        llm: Arc<dyn ChatCompleter>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            graph,
            llm,
            options,
        }
    }

    /// Create the pipeline backed by the configured remote services
    ///
    /// # Errors
    /// - Embedding service configuration errors (cache directory, Redis URL)
    /// - Vector index discovery errors (missing index, auth failures)
    /// - HTTP client build errors
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder = Arc::new(EmbeddingService::new(config)?);
        let index = Arc::new(PineconeIndex::connect(&config.vector).await?);
        let graph = Arc::new(Neo4jGraph::new(&config.graph)?);
        let llm = Arc::new(LlmService::new(config)?);

        Ok(Self::new(
            embedder,
            index,
            graph,
            llm,
            PipelineOptions::from_config(config),
        ))
    }

    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Fetch vector matches and expand them through the graph.
    ///
    /// A failing graph store is logged and yields vector-only context.
    ///
    /// # Errors
    /// - Embedding errors
    /// - Vector search errors
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        debug!("Step 1: Embedding query");
        let vector = self.embedder.embed(query).await?;

        debug!("Step 2: Vector search (top_k={})", self.options.top_k);
        let matches = self.index.query(&vector, self.options.top_k).await?;
        debug!("Retrieved {} matches", matches.len());

        let ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();

        debug!("Step 3: Graph expansion from {} seeds", ids.len());
        let (facts, graph_degraded) = match self.graph.expand(&ids).await {
            Ok(facts) => (facts, false),
            Err(e) => {
                warn!("Graph expansion failed, continuing with vector context only: {}", e);
                (Vec::new(), true)
            }
        };
        debug!("Retrieved {} graph facts", facts.len());

        Ok(Retrieval {
            matches,
            facts,
            graph_degraded,
        })
    }

    /// Answer a query with an itinerary
    ///
    /// # Errors
    /// - Embedding or vector search errors
    /// - LLM generation errors (API failures, empty completions)
    pub async fn answer(&self, query: &str, preferences: &Preferences) -> Result<HybridAnswer> {
        info!("Processing query: {}", query);

        let retrieval = self.retrieve(query).await?;

        let mut preferences = preferences.clone();
        if preferences.template.is_none() {
            preferences.template = Some(self.options.default_template.clone());
        }

        debug!("Step 4: Building prompt");
        let prompt = build_prompt(query, &retrieval.matches, &retrieval.facts, &preferences);
        let days = trip_length(query);

        debug!("Step 5: Generating answer");
        let mut raw_answer = self.llm.complete(&prompt, self.options.max_tokens).await?;

        let mut retried = false;
        let validation = validate_response(&raw_answer, days);
        if let Validation::Incomplete { .. } = validation {
            info!("{} Retrying once with extended budget", validation);
            let followup = retry_prompt(&prompt);
            raw_answer = self
                .llm
                .complete(&followup, self.options.retry_max_tokens)
                .await?;
            retried = true;

            let second = validate_response(&raw_answer, days);
            if !second.is_valid() {
                warn!("Retried answer still incomplete: {}", second);
            }
        }

        debug!("Step 6: Expanding citations and sanitizing");
        let answer = sanitize_answer(&expand_citations(
            &raw_answer,
            &retrieval.matches,
            &retrieval.facts,
        ));

        info!("Query completed (retried={}, graph_degraded={})", retried, retrieval.graph_degraded);

        Ok(HybridAnswer {
            query: query.to_string(),
            answer,
            raw_answer,
            matches: retrieval.matches,
            facts: retrieval.facts,
            trip_length: days,
            retried,
            graph_degraded: retrieval.graph_degraded,
        })
    }
}

/// Result of one pipeline call
#[derive(Debug, Clone, Serialize)]
pub struct HybridAnswer {
    pub query: String,
    /// Final text after citation expansion and sanitization
    pub answer: String,
    /// Model output as received
    pub raw_answer: String,
    pub matches: Vec<Match>,
    pub facts: Vec<GraphFact>,
    pub trip_length: u32,
    pub retried: bool,
    pub graph_degraded: bool,
}

impl HybridAnswer {
    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Query: {}\n\n", self.query));
        output.push_str(&format!("Answer:\n{}\n\n", self.answer));
        output.push_str(&format!(
            "Sources ({} matches, {} graph facts):\n",
            self.matches.len(),
            self.facts.len()
        ));

        for (idx, m) in self.matches.iter().enumerate().take(5) {
            let name = if m.metadata.name.is_empty() {
                "unknown"
            } else {
                &m.metadata.name
            };
            output.push_str(&format!(
                "  {}. {} ({}, Score: {:.2})\n",
                idx + 1,
                name,
                m.id,
                m.score
            ));
        }

        if self.graph_degraded {
            output.push_str("  (graph context unavailable)\n");
        }

        output
    }
}
