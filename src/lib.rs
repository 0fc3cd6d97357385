pub mod bench;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod text;
pub mod vector;

#[cfg(test)]
mod errors_unit_tests;

pub use config::AppConfig;
pub use errors::*;
