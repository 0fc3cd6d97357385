//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - chat: Interactive chat and one-shot questions
//! - ingest: Dataset upload to the vector index and graph
//! - bench: Graph fetch benchmark
//! - info: Information display (config)

pub mod bench;
pub mod chat;
pub mod info;
pub mod ingest;

// Re-export all public handlers
pub use bench::*;
pub use chat::*;
pub use info::*;
pub use ingest::*;
