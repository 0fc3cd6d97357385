use clap::Parser;
use hybrid_chat::cli::*;
use hybrid_chat::config::AppConfig;
use hybrid_chat::models::Preferences;
use hybrid_chat::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load_from(cli.config.as_deref())?;

    // Initialize logging
    if cli.verbose {
        hybrid_chat::logging::init_logging_with_level("debug", &config.logging.dir)?;
    } else {
        hybrid_chat::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Chat { template } => {
            handle_chat(&config, template).await?;
        }
        Commands::Ask {
            query,
            budget,
            interests,
            template,
            show_sources,
        } => {
            let mut preferences = Preferences::new(budget, interests);
            if let Some(template) = template {
                preferences = preferences.with_template(template);
            }
            handle_ask(&config, query, preferences, show_sources).await?;
        }
        Commands::Ingest(ingest_command) => match ingest_command {
            IngestCommands::Vectors { file } => {
                handle_ingest_vectors(&config, &file).await?;
            }
            IngestCommands::Graph { file } => {
                handle_ingest_graph(&config, &file).await?;
            }
        },
        Commands::Bench(bench_command) => match bench_command {
            BenchCommands::Graph {
                node_ids,
                iterations,
                concurrency,
                rounds,
                export,
            } => {
                handle_bench_graph(&config, node_ids, iterations, concurrency, rounds, export)
                    .await?;
            }
        },
        Commands::Config => {
            handle_config_command(&config)?;
        }
    }

    Ok(())
}
