//! Benchmark handlers

use std::path::PathBuf;

use crate::bench::parse_node_ids;
use crate::bench::run_graph_bench;
use crate::bench::BenchOptions;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::graph::Neo4jGraph;
use crate::AppConfig;
use crate::Result;

/// Handle `bench graph`
pub async fn handle_bench_graph(
    config: &AppConfig,
    node_ids: Option<String>,
    iterations: usize,
    concurrency: usize,
    rounds: usize,
    export: Option<PathBuf>,
) -> Result<()> {
    let raw_ids = node_ids.or_else(|| std::env::var("BENCH_NODE_IDS").ok());
    let options = BenchOptions {
        node_ids: parse_node_ids(raw_ids.as_deref()),
        iterations,
        concurrency,
        concurrent_rounds: rounds,
    };

    print_info(&format!("Node IDs: {:?}", options.node_ids));
    print_info(&format!("Iterations: {iterations}"));

    let graph = Neo4jGraph::new(&config.graph)?;
    let report = run_graph_bench(&graph, &options).await?;

    for (label, stats) in [
        ("Sequential expand", &report.sequential),
        ("Concurrent expand", &report.concurrent),
    ] {
        match stats {
            Some(stats) => println!("{}", stats.format()),
            None => print_warning(&format!("{label}: no successful runs")),
        }
    }

    if let Some(path) = export {
        report.export_json(&path)?;
        print_success(&format!("Report exported to: {}", path.display()));
    }
    Ok(())
}
