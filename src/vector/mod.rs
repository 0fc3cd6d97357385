//! Vector similarity search over the travel entity index

pub mod pinecone;

use async_trait::async_trait;
pub use pinecone::PineconeIndex;
use serde::Serialize;

use crate::errors::Result;
use crate::models::Match;
use crate::models::MatchMetadata;

/// A vector to write into the index
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: MatchMetadata,
}

/// Nearest-neighbour search over stored vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches ordered by descending score
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>>;

    /// Insert or replace vectors
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;
}

/// Sort by descending score and cut to `top_k`
#[must_use]
pub fn rank_matches(mut matches: Vec<Match>, top_k: usize) -> Vec<Match> {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_k);
    matches
}
