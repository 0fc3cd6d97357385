//! CLI output formatting utilities

use crate::rag::HybridAnswer;
use crate::text::truncate_str;
use crate::AppConfig;

/// Print the final answer block
pub fn print_answer(answer: &HybridAnswer) {
    println!("\n=== Assistant Answer ===\n");
    println!("{}", answer.answer);
    println!("\n=== End ===\n");
}

/// Print retrieval details below an answer
pub fn print_sources(answer: &HybridAnswer) {
    println!(
        "📚 Sources ({} matches, {} graph facts):",
        answer.matches.len(),
        answer.facts.len()
    );
    for (idx, m) in answer.matches.iter().enumerate() {
        println!(
            "  {}. {} [{}] {} | Score: {:.2}",
            idx + 1,
            m.id,
            m.metadata.entity_type,
            m.metadata.name,
            m.score
        );
    }
    for fact in answer.facts.iter().take(15) {
        println!(
            "  - ({}) -[{}]-> ({}) {}",
            fact.source.as_deref().unwrap_or("match"),
            fact.rel,
            fact.target_id,
            truncate_str(&fact.target_name, 60)
        );
    }
    if answer.graph_degraded {
        print_warning("Graph context unavailable; answer used vector matches only");
    }
    if answer.retried {
        print_info("First answer was incomplete; retried once");
    }
    println!("\n--- Raw model output ---\n{}", answer.raw_answer);
}

/// Print configuration with secrets masked
pub fn print_config(config: &AppConfig) {
    println!("📋 Hybrid Chat Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.dir);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Key: {}", mask_secret(&config.embeddings.api_key));
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Cache dir: {}", config.embeddings.cache_dir);
    println!(
        "  Redis cache: {}",
        config
            .embedding_redis_url()
            .map_or_else(|| "disabled".to_string(), mask_url)
    );
    println!();

    println!("🔎 Vector index:");
    println!("  Index: {}", config.vector.index_name);
    println!(
        "  Host: {}",
        if config.vector.index_host.is_empty() {
            "(discovered)"
        } else {
            &config.vector.index_host
        }
    );
    println!("  Region: {}/{}", config.vector.cloud, config.vector.region);
    println!("  Dimension: {}", config.vector.dimension);
    println!("  Top k: {}", config.top_k());
    println!("  Key: {}", mask_secret(&config.vector.api_key));
    println!();

    println!("🕸️  Graph:");
    println!("  URI: {}", config.neo4j_uri());
    println!("  User: {}", config.graph.user);
    println!("  Password: {}", mask_secret(&config.graph.password));
    println!("  Database: {}", config.graph.database);
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Key: {}", mask_secret(config.llm_key()));
    println!();

    println!("⚙️  Pipeline:");
    println!("  Max tokens: {}", config.pipeline.max_tokens);
    println!("  Retry max tokens: {}", config.pipeline.retry_max_tokens);
    println!("  Default template: {}", config.pipeline.default_template);
}

/// Show only the last four characters of a secret
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        "(not set)".to_string()
    } else if count <= 8 {
        "***".to_string()
    } else {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("***{tail}")
    }
}

/// Hide credentials embedded in a URL
fn mask_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "***invalid***".to_string(),
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
