//! Graph fetch latency benchmark

use std::path::Path;
use std::time::Duration;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::errors::Result;
use crate::graph::GraphStore;

/// Node ids used when neither `--node-ids` nor `BENCH_NODE_IDS` is set
pub const DEFAULT_NODE_IDS: [&str; 3] = ["sample1", "sample2", "sample3"];

/// Parse a comma-separated id list; blank input yields the default sample ids
#[must_use]
pub fn parse_node_ids(raw: Option<&str>) -> Vec<String> {
    let ids: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect();
    if ids.is_empty() {
        DEFAULT_NODE_IDS.iter().map(ToString::to_string).collect()
    } else {
        ids
    }
}

/// Nearest-rank percentile over sorted samples, `p` in 0..=100
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let last = sorted.len() - 1;
    let idx = ((p / 100.0) * last as f64).round() as usize;
    sorted.get(idx.min(last)).copied()
}

/// Summary statistics of successful runs, in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchStats {
    pub name: String,
    pub count: usize,
    pub failed: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent with fewer than two runs
    pub stddev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl BenchStats {
    /// Summarize timings; `None` when no run succeeded
    #[must_use]
    pub fn from_samples(name: &str, samples: &[f64], failed: usize) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };
        let stddev = (count > 1).then(|| {
            let var = sorted.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            name: name.to_string(),
            count,
            failed,
            mean,
            median,
            stddev,
            min: sorted[0],
            max: sorted[count - 1],
            p50: percentile(&sorted, 50.0).unwrap_or(median),
            p95: percentile(&sorted, 95.0).unwrap_or(median),
            p99: percentile(&sorted, 99.0).unwrap_or(median),
        })
    }

    /// Human-readable report
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = format!("--- {} ---\n", self.name);
        out.push_str(&format!("runs: {} ({} failed)\n", self.count, self.failed));
        out.push_str(&format!("mean: {:.4}s\n", self.mean));
        out.push_str(&format!("median: {:.4}s\n", self.median));
        if let Some(stddev) = self.stddev {
            out.push_str(&format!("stdev: {stddev:.4}s\n"));
        }
        out.push_str(&format!("min: {:.4}s\n", self.min));
        out.push_str(&format!("max: {:.4}s\n", self.max));
        out.push_str(&format!("p95: {:.4}s\n", self.p95));
        out
    }
}

/// Benchmark settings
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub node_ids: Vec<String>,
    pub iterations: usize,
    /// Parallel fetches per round in the concurrent phase; 0 skips it
    pub concurrency: usize,
    pub concurrent_rounds: usize,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            node_ids: parse_node_ids(None),
            iterations: 5,
            concurrency: 10,
            concurrent_rounds: 20,
        }
    }
}

/// Results of a benchmark run
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub node_ids: Vec<String>,
    pub generated_at: String,
    pub sequential: Option<BenchStats>,
    pub concurrent: Option<BenchStats>,
}

impl BenchReport {
    /// Write the report as pretty JSON
    ///
    /// # Errors
    /// - Serialization or file write errors
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Benchmark report written to {}", path.as_ref().display());
        Ok(())
    }
}

async fn timed_expand(graph: &dyn GraphStore, ids: &[String]) -> Result<Duration> {
    let start = Instant::now();
    graph.expand(ids).await?;
    Ok(start.elapsed())
}

/// Time `expand` sequentially, then in concurrent rounds.
///
/// Failed iterations are logged and excluded from the statistics.
///
/// # Errors
/// Never fails on graph errors; those are counted per phase.
pub async fn run_graph_bench(graph: &dyn GraphStore, options: &BenchOptions) -> Result<BenchReport> {
    info!("Warming up with {} node ids", options.node_ids.len());
    if let Err(e) = graph.expand(&options.node_ids).await {
        warn!("Warmup raised: {}", e);
    }

    let mut samples = Vec::with_capacity(options.iterations);
    let mut failed = 0;
    for i in 0..options.iterations {
        match timed_expand(graph, &options.node_ids).await {
            Ok(elapsed) => samples.push(elapsed.as_secs_f64()),
            Err(e) => {
                warn!("Iteration {} raised: {}", i + 1, e);
                failed += 1;
            }
        }
    }
    let sequential = BenchStats::from_samples("Sequential expand", &samples, failed);

    let mut latencies = Vec::new();
    let mut concurrent_failed = 0;
    if options.concurrency > 0 {
        for _ in 0..options.concurrent_rounds {
            let round = (0..options.concurrency).map(|_| timed_expand(graph, &options.node_ids));
            for result in join_all(round).await {
                match result {
                    Ok(elapsed) => latencies.push(elapsed.as_secs_f64()),
                    Err(_) => concurrent_failed += 1,
                }
            }
        }
        if concurrent_failed > 0 {
            warn!("{} concurrent fetches failed", concurrent_failed);
        }
    }
    let concurrent = BenchStats::from_samples(
        &format!("Concurrent expand: {} parallel tasks", options.concurrency),
        &latencies,
        concurrent_failed,
    );

    Ok(BenchReport {
        node_ids: options.node_ids.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        sequential,
        concurrent,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::HybridChatError;
    use crate::models::DatasetNode;
    use crate::models::GraphFact;

    /// Fails every `fail_every`-th call (counting from 1)
    struct FlakyGraph {
        calls: AtomicUsize,
        fail_every: usize,
    }

    #[async_trait]
    impl GraphStore for FlakyGraph {
        async fn expand(&self, _ids: &[String]) -> Result<Vec<GraphFact>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every > 0 && call % self.fail_every == 0 {
                return Err(HybridChatError::GraphError("timeout".to_string()));
            }
            Ok(Vec::new())
        }

        async fn create_constraints(&self) -> Result<()> {
            Ok(())
        }

        async fn upsert_node(&self, _node: &DatasetNode) -> Result<()> {
            Ok(())
        }

        async fn create_relationship(&self, _s: &str, _r: &str, _t: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_parse_node_ids() {
        assert_eq!(parse_node_ids(Some(" a, b ,,c ")), vec!["a", "b", "c"]);
        assert_eq!(parse_node_ids(Some(" , ")), vec!["sample1", "sample2", "sample3"]);
        assert_eq!(parse_node_ids(None).len(), 3);
    }

    #[test]
    fn test_stats_from_samples() {
        let stats = BenchStats::from_samples("t", &[4.0, 1.0, 3.0, 2.0], 1).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.failed, 1);
        assert!((stats.mean - 2.5).abs() < 1e-9);
        assert!((stats.median - 2.5).abs() < 1e-9);
        assert!((stats.stddev.unwrap() - 1.290_994_448_7).abs() < 1e-6);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.p95, 4.0);
    }

    #[test]
    fn test_single_sample_has_no_stddev() {
        let stats = BenchStats::from_samples("t", &[0.5], 0).unwrap();
        assert!(stats.stddev.is_none());
        assert_eq!(stats.median, 0.5);
        assert!(stats.format().contains("runs: 1 (0 failed)"));
    }

    #[test]
    fn test_no_samples_gives_none() {
        assert!(BenchStats::from_samples("t", &[], 3).is_none());
        assert!(percentile(&[], 95.0).is_none());
    }

    #[tokio::test]
    async fn test_failed_iterations_are_excluded() {
        // Warmup is call 1; sequential iterations are calls 2..=7, of which 3 and 6 fail.
        let graph = FlakyGraph {
            calls: AtomicUsize::new(0),
            fail_every: 3,
        };
        let options = BenchOptions {
            node_ids: vec!["a".to_string()],
            iterations: 6,
            concurrency: 0,
            concurrent_rounds: 0,
        };

        let report = run_graph_bench(&graph, &options).await.unwrap();
        let sequential = report.sequential.unwrap();
        assert_eq!(sequential.count, 4);
        assert_eq!(sequential.failed, 2);
        assert!(report.concurrent.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_phase_and_export() {
        let graph = FlakyGraph {
            calls: AtomicUsize::new(0),
            fail_every: 0,
        };
        let options = BenchOptions {
            node_ids: vec!["a".to_string()],
            iterations: 2,
            concurrency: 3,
            concurrent_rounds: 2,
        };

        let report = run_graph_bench(&graph, &options).await.unwrap();
        assert_eq!(report.concurrent.as_ref().unwrap().count, 6);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        report.export_json(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["sequential"]["count"], 2);
        assert_eq!(value["node_ids"][0], "a");
    }
}
