//! Chat and single-question handlers

use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::io::Stdin;

use crate::cli::output::print_answer;
use crate::cli::output::print_error;
use crate::cli::output::print_sources;
use crate::cli::output::print_warning;
use crate::models::Preferences;
use crate::rag::HybridPipeline;
use crate::AppConfig;
use crate::Result;

const DEFAULT_BUDGET: &str = "medium";
const DEFAULT_INTERESTS: &str = "romantic";

/// Words that end the interactive loop
fn is_exit(input: &str) -> bool {
    input.is_empty() || matches!(input.to_lowercase().as_str(), "exit" | "quit")
}

/// Lower-cased answer, or the default when blank
fn preference_or(input: Option<String>, default: &str) -> String {
    input
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

async fn prompt_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

/// Handle the interactive chat loop
pub async fn handle_chat(config: &AppConfig, template: Option<String>) -> Result<()> {
    let pipeline = HybridPipeline::from_config(config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Hybrid travel assistant. Type 'exit' to quit.");
    let budget = preference_or(
        prompt_line(&mut lines, "Enter your budget (e.g., low, medium, high): ").await?,
        DEFAULT_BUDGET,
    );
    let interests = preference_or(
        prompt_line(
            &mut lines,
            "Enter your interests (e.g., romantic, adventure, culture): ",
        )
        .await?,
        DEFAULT_INTERESTS,
    );

    let mut preferences = Preferences::new(budget, interests);
    if let Some(template) = template {
        preferences = preferences.with_template(template);
    }

    loop {
        let Some(query) = prompt_line(&mut lines, "\nEnter your travel question: ").await? else {
            break;
        };
        if is_exit(&query) {
            break;
        }

        match pipeline.answer(&query, &preferences).await {
            Ok(answer) => {
                if answer.graph_degraded {
                    print_warning("Could not fetch graph context. Using vector-only response.");
                }
                print_answer(&answer);
            }
            Err(e) => print_error(&format!("Failed to answer: {e}")),
        }
    }

    Ok(())
}

/// Handle a one-shot question
pub async fn handle_ask(
    config: &AppConfig,
    query: String,
    preferences: Preferences,
    show_sources: bool,
) -> Result<()> {
    let pipeline = HybridPipeline::from_config(config).await?;
    let answer = pipeline.answer(&query, &preferences).await?;

    print_answer(&answer);
    if show_sources {
        print_sources(&answer);
    }
    Ok(())
}
