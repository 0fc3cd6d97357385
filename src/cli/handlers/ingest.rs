//! Dataset ingest handlers

use std::path::Path;

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::embeddings::EmbeddingService;
use crate::graph::Neo4jGraph;
use crate::ingest::load_dataset;
use crate::ingest::load_graph;
use crate::ingest::prepare_vector_items;
use crate::ingest::upload_vectors;
use crate::ingest::BATCH_PAUSE;
use crate::vector::pinecone::create_index_if_not_exists;
use crate::vector::PineconeIndex;
use crate::AppConfig;
use crate::Result;

/// Handle `ingest vectors`
pub async fn handle_ingest_vectors(config: &AppConfig, file: &Path) -> Result<()> {
    let nodes = load_dataset(file)?;
    let items = prepare_vector_items(&nodes);
    if items.is_empty() {
        print_warning("No nodes with usable text; nothing to upload");
        return Ok(());
    }
    print_info(&format!(
        "Preparing to upsert {} items ({} skipped)...",
        items.len(),
        nodes.len() - items.len()
    ));

    if create_index_if_not_exists(&config.vector).await? {
        print_info(&format!("Created index '{}'", config.vector.index_name));
    }

    let embedder = EmbeddingService::new(config)?;
    let index = PineconeIndex::connect(&config.vector).await?;
    let stats = upload_vectors(&items, &embedder, &index, BATCH_PAUSE).await?;

    print_success(&format!(
        "Uploaded {}/{} items ({:.1}%)",
        stats.processed,
        stats.total,
        stats.success_rate()
    ));
    Ok(())
}

/// Handle `ingest graph`
pub async fn handle_ingest_graph(config: &AppConfig, file: &Path) -> Result<()> {
    let nodes = load_dataset(file)?;
    let graph = Neo4jGraph::new(&config.graph)?;
    let stats = load_graph(&nodes, &graph).await?;

    if stats.failed > 0 {
        print_warning(&format!("{} writes failed; see the log for details", stats.failed));
    }
    print_success(&format!(
        "Loaded {}/{} nodes into the graph",
        stats.processed, stats.total
    ));
    Ok(())
}
