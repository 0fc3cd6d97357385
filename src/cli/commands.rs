//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "hybrid-chat")]
#[command(about = "Hybrid vector + graph travel assistant")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat: asks for preferences, then answers questions until exit
    Chat {
        /// Prompt template (concise, chain_of_thought)
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Answer a single question
    Ask {
        /// The travel question
        query: String,
        /// Budget preference
        #[arg(short, long, default_value = "medium")]
        budget: String,
        /// Interests preference
        #[arg(short, long, default_value = "romantic")]
        interests: String,
        /// Prompt template (concise, chain_of_thought)
        #[arg(short, long)]
        template: Option<String>,
        /// Print the raw model output and retrieved sources
        #[arg(long)]
        show_sources: bool,
    },
    /// Load the travel dataset into the external stores
    #[command(subcommand)]
    Ingest(IngestCommands),
    /// Benchmarks
    #[command(subcommand)]
    Bench(BenchCommands),
    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
pub enum IngestCommands {
    /// Embed nodes and upsert them into the vector index
    Vectors {
        /// Dataset JSON file
        #[arg(default_value = "vietnam_travel_dataset.json")]
        file: PathBuf,
    },
    /// Merge nodes and relationships into the graph database
    Graph {
        /// Dataset JSON file
        #[arg(default_value = "vietnam_travel_dataset.json")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum BenchCommands {
    /// Time graph neighbour expansion
    Graph {
        /// Comma-separated node ids (default: BENCH_NODE_IDS or sample ids)
        #[arg(long)]
        node_ids: Option<String>,
        /// Sequential iterations
        #[arg(short = 'n', long, default_value = "5")]
        iterations: usize,
        /// Parallel fetches per concurrent round (0 to skip)
        #[arg(long, default_value = "10")]
        concurrency: usize,
        /// Concurrent rounds
        #[arg(long, default_value = "20")]
        rounds: usize,
        /// Export the report to JSON
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_defaults() {
        let cli = Cli::try_parse_from(["hybrid-chat", "ask", "Plan a 4-day trip"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Ask {
                query,
                budget,
                interests,
                template,
                show_sources,
            } => {
                assert_eq!(query, "Plan a 4-day trip");
                assert_eq!(budget, "medium");
                assert_eq!(interests, "romantic");
                assert!(template.is_none());
                assert!(!show_sources);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["hybrid-chat", "config", "--verbose", "--config", "x.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_parse_bench_graph() {
        let cli = Cli::try_parse_from([
            "hybrid-chat",
            "bench",
            "graph",
            "--node-ids",
            "a,b",
            "-n",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Bench(BenchCommands::Graph {
                node_ids,
                iterations,
                ..
            }) => {
                assert_eq!(node_ids.as_deref(), Some("a,b"));
                assert_eq!(iterations, 3);
            }
            _ => panic!("expected bench graph"),
        }
    }

    #[test]
    fn test_ingest_requires_subcommand() {
        assert!(Cli::try_parse_from(["hybrid-chat", "ingest"]).is_err());
    }
}
