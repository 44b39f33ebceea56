//! Main module for the Aisle CLI application.
//!
//! Handles command parsing, configuration loading, and initialization, then
//! dispatches to the conversational assistant, one-shot search, or cache
//! maintenance.
//!
//! # Examples
//!
//! ```sh
//! aisle init
//! aisle chat
//! aisle search "women's linen shirts"
//! aisle similar "Linen Shirt" -k 5
//! aisle cache stats
//! ```

use clap::Parser;
use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, Print, SetAttribute, SetForegroundColor},
};
use once_cell::sync::OnceCell;
use std::{
    error::Error,
    fs,
    io::{Write, stdout},
    path::{Path, PathBuf},
};
use tracing::debug;

use aisle::assistant::{Assistant, TurnReply};
use aisle::commands::{CacheAction, Cli, Commands};
use aisle::config::{AisleConfig, load_config};
use aisle::embeddings::EmbeddingClient;
use aisle::engine::{Recommendation, RecommendationEngine};
use aisle::summary_cache::SummaryCache;

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Parse arguments, load configuration, and execute the chosen command.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => aisle::config_dir()?.join("config.yaml"),
    };

    match cli.command {
        Commands::Init => init(&config_path),
        Commands::Chat => chat_loop(load(&config_path)?).await,
        Commands::Search { query } => search_once(load(&config_path)?, &query).await,
        Commands::Similar { product, count } => similar(load(&config_path)?, &product, count),
        Commands::Cache { action } => cache_admin(load(&config_path)?, action),
    }
}

fn load(config_path: &Path) -> Result<AisleConfig, Box<dyn Error>> {
    debug!("Loading config from: {}", config_path.display());
    let path = config_path
        .to_str()
        .ok_or("config path is not valid UTF-8")?;
    Ok(load_config(path)?)
}

/// Interactive shopping conversation.
///
/// The first message runs a catalog search; every further message narrows the
/// captured candidate pool. `reset` starts a new search, `exit` quits.
async fn chat_loop(config: AisleConfig) -> Result<(), Box<dyn Error>> {
    let mut assistant = Assistant::new(config)?;
    println!("Describe what you're looking for. (\"reset\" starts over, \"exit\" quits.)");

    loop {
        let mut out = stdout();
        out.execute(SetForegroundColor(Color::Green))?;
        out.execute(Print("\nYou: "))?;
        out.execute(SetForegroundColor(Color::Reset))?;
        out.flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match input {
            "" => continue,
            "exit" => break,
            "reset" => {
                assistant.reset();
                println!("Starting fresh — what are you looking for?");
                continue;
            }
            _ => {}
        }

        match assistant.take_turn(input).await {
            Ok(reply) => render_reply(&reply)?,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        }
    }

    Ok(())
}

/// Print one turn's recommendations, summaries, and follow-up questions.
fn render_reply(reply: &TurnReply) -> Result<(), Box<dyn Error>> {
    let mut out = stdout();

    for (rec, product_summary) in reply.recommendations.iter().zip(reply.summaries.iter()) {
        out.execute(SetAttribute(Attribute::Bold))?;
        out.execute(Print(format!("\n{}", rec.product_name)))?;
        out.execute(SetAttribute(Attribute::Reset))?;
        out.execute(Print(format!(
            "  {}  (match {:.3})\n",
            stars(rec.rating),
            rec.score
        )))?;
        match &product_summary.summary {
            Some(summary) => out.execute(Print(format!("  {summary}\n")))?,
            None => out.execute(Print("  (no review summary available)\n"))?,
        };
    }

    out.execute(SetForegroundColor(Color::Blue))?;
    out.execute(Print(format!("\n{}\n", reply.followups)))?;
    out.execute(SetForegroundColor(Color::Reset))?;
    out.flush()?;
    Ok(())
}

/// Render a 0.0–5.0 rating as filled and hollow stars.
fn stars(rating: f32) -> String {
    let filled = rating.clamp(0.0, 5.0) as usize;
    format!("{}{} ({rating:.1})", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// One-shot search with a direct query string (no intent rewriting).
async fn search_once(config: AisleConfig, query: &str) -> Result<(), Box<dyn Error>> {
    let engine = RecommendationEngine::load(config.snapshot_path.as_ref())?;
    let embedder = EmbeddingClient::new(
        &config.api_key,
        &config.api_base,
        &config.embedding_model,
        config.embedding_dimension,
    )?;

    let embedding = embedder.embed(query).await?;
    let (shown, _buffer) = engine.search(&embedding, config.display_k, config.buffer_k)?;
    print_recommendations(&shown);
    Ok(())
}

/// Products similar to a cataloged product, via the combined index.
fn similar(config: AisleConfig, product: &str, count: Option<usize>) -> Result<(), Box<dyn Error>> {
    let engine = RecommendationEngine::load(config.snapshot_path.as_ref())?;
    let similar = engine.similar_to(product, count.unwrap_or(5))?;
    print_recommendations(&similar);
    Ok(())
}

fn print_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        println!("No matches.");
        return;
    }
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} {} (match {:.3})",
            i + 1,
            rec.product_name,
            stars(rec.rating),
            rec.score
        );
    }
}

/// Summary cache maintenance.
fn cache_admin(config: AisleConfig, action: CacheAction) -> Result<(), Box<dyn Error>> {
    let mut cache = SummaryCache::open(&config.cache_path);

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!(
                "{} cached summaries, {} bytes on disk{}",
                stats.total_entries,
                stats.file_size_bytes,
                if stats.file_exists { "" } else { " (no cache file yet)" }
            );
        }
        CacheAction::Clear => {
            cache.clear();
            println!("Summary cache cleared.");
        }
        CacheAction::Evict { days } => {
            let days = days.unwrap_or(config.cache_retention_days);
            let removed = cache.evict_older_than(chrono::Duration::days(days as i64));
            println!("Evicted {removed} entries not read in the last {days} days.");
        }
    }
    Ok(())
}

/// Initializes the application's configuration.
///
/// Creates the configuration directory and writes a default `config.yaml`
/// pointing the snapshot and cache paths into that directory.
///
/// # Errors
/// Returns an error if the directory or file cannot be created, or the
/// configuration cannot be serialized to YAML.
fn init(config_path: &Path) -> Result<(), Box<dyn Error>> {
    let config_dir = aisle::config_dir()?;
    fs::create_dir_all(&config_dir)?;

    let config = AisleConfig {
        api_base: "https://api.openai.com/v1".to_string(),
        api_key: "CHANGEME".to_string(),
        model: "gpt-4o-mini".to_string(),
        embedding_model: "text-embedding-3-small".to_string(),
        embedding_dimension: 1536,
        snapshot_path: path_string(config_dir.join("catalog.bin"))?,
        cache_path: path_string(config_dir.join("product_summaries.json"))?,
        cache_retention_days: 30,
        display_k: 6,
        buffer_k: 30,
    };

    let config_yaml = serde_yaml::to_string(&config)?;
    fs::write(config_path, config_yaml)?;
    println!("Wrote default config to {}", config_path.display());

    Ok(())
}

fn path_string(path: PathBuf) -> Result<String, Box<dyn Error>> {
    Ok(path
        .to_str()
        .ok_or("config directory is not valid UTF-8")?
        .to_string())
}
