//! CLI for the teatime trend retrieval engine.
//!
//! Subcommands:
//!  - `search`   : dense-first retrieval with keyword fallback, enriched with timelines.
//!  - `timeline` : first/last/all dates a topic trended on.
//!  - `info`     : corpus size, date bounds and embedding snapshot status.
//!  - `index`    : (re)build the embedding snapshot next to the corpus.
//!
//! The engine never embeds queries itself. `search --embedding FILE` passes a
//! precomputed query vector (a JSON array of floats); without it the query is
//! answered by keyword match only.
//!
//! Usage examples:
//!  cargo run -p teatime -- --data-dir data search "solar eclipse" -k 5 --start 2024-01-01
//!  cargo run -p teatime -- timeline Eclipse --json

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

/// Local library crate export (hyphen -> underscore).
use teatime::temporal::normalize_date;
use teatime::{
    load_engine, rebuild_snapshot, resolve_config, EngineConfig, HashingEmbedder, ProgressCallback,
    RetrievalEngine,
};

/// CLI entrypoint.
#[derive(Parser)]
#[command(
    name = "teatime",
    about = "teatime CLI: search trending topics by meaning, keyword and date",
    version
)]
struct Cli {
    /// Directory holding the corpus CSV and embedding snapshot.
    #[arg(long, global = true, value_name = "DIR", env = "TEATIME_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Optional TOML config file (file names, oversample, k limits).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve topics for a query within an optional date window.
    Search(SearchArgs),

    /// Show when a topic trended.
    Timeline(TimelineArgs),

    /// Print corpus and snapshot statistics.
    Info(InfoArgs),

    /// Build the embedding snapshot for the corpus.
    Index(IndexArgs),
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
struct SearchArgs {
    /// Free-text query; used for keyword matching.
    query: String,

    /// Number of results to return (clamped to 1..=max_k, default from config).
    #[arg(short, long)]
    k: Option<usize>,

    /// Earliest date to include (YYYY-MM-DD or RFC3339).
    #[arg(long)]
    start: Option<String>,

    /// Latest date to include (YYYY-MM-DD or RFC3339).
    #[arg(long)]
    end: Option<String>,

    /// JSON file holding a precomputed query embedding (array of floats).
    #[arg(long, value_name = "PATH")]
    embedding: Option<PathBuf>,

    /// Output results as JSON to stdout.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `timeline` subcommand.
#[derive(Args, Debug)]
struct TimelineArgs {
    /// Exact topic name (case-sensitive).
    topic: String,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
struct InfoArgs {
    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `index` subcommand.
#[derive(Args, Debug)]
struct IndexArgs {
    /// Width of the hashed topic embeddings.
    #[arg(long, default_value_t = teatime::embed::DEFAULT_HASH_DIM)]
    dim: usize,
}

/// Application entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref(), cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Search(args) => run_search(&cfg, args),
        Commands::Timeline(args) => run_timeline(&cfg, args),
        Commands::Info(args) => run_info(&cfg, args),
        Commands::Index(args) => run_index(&cfg, args),
    }
}

fn parse_date_flag(flag: &str, value: &str) -> Result<String> {
    normalize_date(value).with_context(|| format!("Failed to parse {}", flag))
}

fn read_embedding(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let vector: Vec<f32> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a JSON array of numbers", path.display()))?;
    anyhow::ensure!(!vector.is_empty(), "{} holds an empty embedding", path.display());
    Ok(vector)
}

fn open_engine(cfg: &EngineConfig) -> Result<RetrievalEngine> {
    let start_load = Instant::now();
    let engine = load_engine(cfg)?;
    tracing::debug!(elapsed = ?start_load.elapsed(), "engine loaded");
    Ok(engine)
}

/// Run the `search` subcommand.
fn run_search(cfg: &EngineConfig, args: SearchArgs) -> Result<()> {
    let start = args
        .start
        .as_deref()
        .map(|s| parse_date_flag("--start", s))
        .transpose()?;
    let end = args
        .end
        .as_deref()
        .map(|s| parse_date_flag("--end", s))
        .transpose()?;
    let vector = args.embedding.as_deref().map(read_embedding).transpose()?;
    let k = cfg.clamp_k(args.k);

    let engine = open_engine(cfg)?;
    let r = engine.retrieve(
        vector.as_deref(),
        &args.query,
        k,
        start.as_deref(),
        end.as_deref(),
    );

    if args.json {
        let out = json!({
            "query": args.query,
            "k": k,
            "mode": r.mode,
            "window": r.window,
            "ingredients": r.ingredients,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Top {} results for query {:?} ({:?}, {} .. {}):",
        k, args.query, r.mode, r.window.start, r.window.end
    );
    if r.ingredients.is_empty() {
        println!("  (no matching topics)");
    }
    for (i, ing) in r.ingredients.iter().enumerate() {
        println!(
            "{}. {} score={:.4} first_seen={} last_seen={} days_seen={}",
            i + 1,
            ing.topic,
            ing.score,
            ing.first_seen.as_deref().unwrap_or("-"),
            ing.last_seen.as_deref().unwrap_or("-"),
            ing.days_seen
        );
    }
    Ok(())
}

/// Run the `timeline` subcommand.
fn run_timeline(cfg: &EngineConfig, args: TimelineArgs) -> Result<()> {
    let engine = open_engine(cfg)?;
    let tl = engine.topic_timeline(&args.topic);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tl)?);
        return Ok(());
    }

    if tl.days_seen == 0 {
        println!("Topic {:?} does not appear in the corpus.", tl.topic);
        return Ok(());
    }
    println!(
        "{}: first seen {}, last seen {}, {} day(s)",
        tl.topic,
        tl.first_seen.as_deref().unwrap_or("-"),
        tl.last_seen.as_deref().unwrap_or("-"),
        tl.days_seen
    );
    for d in &tl.dates {
        println!("  {}", d);
    }
    Ok(())
}

/// Run the `info` subcommand.
fn run_info(cfg: &EngineConfig, args: InfoArgs) -> Result<()> {
    let engine = open_engine(cfg)?;
    let s = engine.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }

    println!("Corpus: {}", cfg.corpus_path().display());
    println!("  topics:       {}", s.topics);
    println!("  records:      {}", s.records);
    println!("  rows skipped: {}", s.rows_skipped);
    println!("  date range:   {} .. {}", s.bounds.start, s.bounds.end);
    if s.has_embeddings {
        println!(
            "Embeddings: {} topics, dim {}",
            s.embedding_count,
            engine.embedding_dim().unwrap_or(0)
        );
    } else {
        println!("Embeddings: none (keyword search only)");
    }
    Ok(())
}

/// Run the `index` subcommand.
fn run_index(cfg: &EngineConfig, args: IndexArgs) -> Result<()> {
    anyhow::ensure!(args.dim > 0, "--dim must be positive");
    let embedder = HashingEmbedder::new(args.dim);

    let (progress, finish) = progress_reporter();
    let index = rebuild_snapshot(cfg, &embedder, progress).context("building embedding snapshot")?;
    finish(format!("Embedded {} topics.", index.len()));

    println!(
        "Wrote {} topic embeddings (dim {}) to {}",
        index.len(),
        index.dim(),
        cfg.embeddings_path().display()
    );
    Ok(())
}

/// Progress callback plus a finisher; a bar when the `progress` feature is on.
#[cfg(feature = "progress")]
fn progress_reporter() -> (Option<ProgressCallback>, Box<dyn FnOnce(String)>) {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::sync::Arc;

    const STEPS: u64 = 100;
    let bar = ProgressBar::new(STEPS);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_message("Embedding topics...");

    let progress_cb: ProgressCallback = Arc::new({
        let bar = bar.clone();
        move |msg: String, fraction: f32| {
            bar.set_message(msg);
            bar.set_position((fraction * STEPS as f32).floor() as u64);
        }
    });
    (
        Some(progress_cb),
        Box::new(move |msg: String| bar.finish_with_message(msg)),
    )
}

#[cfg(not(feature = "progress"))]
fn progress_reporter() -> (Option<ProgressCallback>, Box<dyn FnOnce(String)>) {
    (None, Box::new(|msg: String| eprintln!("{}", msg)))
}
