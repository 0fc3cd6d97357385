//! Hybrid RAG (Retrieval-Augmented Generation) module
//!
//! Answers travel queries by combining:
//! - Semantic matches from the vector index
//! - 1- and 2-hop graph facts around those matches
//! - A bounded context summary and structured prompt
//! - One completeness-driven retry and citation/metadata post-processing
//!
//! # Examples
//!
//! ```rust,no_run
//! use hybrid_chat::config::AppConfig;
//! use hybrid_chat::models::Preferences;
//! use hybrid_chat::rag::HybridPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pipeline = HybridPipeline::from_config(&config).await?;
//!
//!     let prefs = Preferences::new("mid-range", "food, culture");
//!     let response = pipeline.answer("Plan a 4-day romantic trip", &prefs).await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod citations;
pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod sanitize;
pub mod validation;

pub use citations::expand_citations;
pub use context::search_summary;
pub use context::ContextMerger;
pub use pipeline::HybridAnswer;
pub use pipeline::HybridPipeline;
pub use pipeline::PipelineOptions;
pub use pipeline::Retrieval;
pub use prompts::build_prompt;
pub use prompts::TemplateKind;
pub use sanitize::sanitize_answer;
pub use validation::validate_response;
pub use validation::Validation;
