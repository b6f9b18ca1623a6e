mod config;
mod delta;
mod discovery;
mod extract;
mod fetch;
mod notify;
mod record;
mod state;
mod summary;
mod xlsx;

use std::path::Path;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use config::Config;

#[derive(Parser)]
#[command(name = "price_book_watch", about = "Michigan spirits price book monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, download, diff, and notify on new price books
    Run,
    /// Parse a local price book and print what extraction sees
    Extract {
        /// Path to an .xlsx price book
        file: std::path::PathBuf,
    },
    /// Show master snapshot and seen-link counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env();

    match cli.command {
        Commands::Run => run(&cfg).await,
        Commands::Extract { file } => extract_one(&file),
        Commands::Stats => stats(&cfg),
    }
}

/// One watch pass. Only link discovery may abort the run; every per-link
/// failure is logged and the loop moves on to the next link.
async fn run(cfg: &Config) -> Result<()> {
    state::ensure_dirs(cfg)?;

    let mut seen = state::load_seen_links(cfg)?;
    let current = discovery::find_price_book_links(cfg).await?;
    let new_links: Vec<String> = current.difference(&seen).cloned().collect();

    info!("Found {} total link(s)", current.len());
    info!("Detected {} new link(s)", new_links.len());

    let client = reqwest::Client::new();
    for url in &new_links {
        if let Err(e) = process_link(cfg, &client, url).await {
            warn!("Failed to handle {}: {e}", url);
        }
    }

    // Failed links are marked seen too, so a permanently broken link is not
    // retried on every future run.
    seen.extend(new_links);
    state::save_seen_links(cfg, &seen)?;
    Ok(())
}

/// Fetch one price book, extract it, diff against the master, and notify.
async fn process_link(cfg: &Config, client: &reqwest::Client, url: &str) -> Result<()> {
    let path = fetch::download_file(client, cfg, url).await?;

    let grid = xlsx::load_grid(&path)?;
    let date_added = record::date_from_path(&path).unwrap_or_else(|| Local::now().date_naive());

    let extraction = match extract::extract(&grid, date_added) {
        Ok(extraction) => extraction,
        Err(e) => {
            // Empty delta, master untouched.
            warn!("Extraction failed for {}: {e}", path.display());
            return Ok(());
        }
    };
    if !extraction.skipped.is_empty() {
        info!("Skipped {} non-record row(s)", extraction.skipped.len());
    }

    let delta = state::compare_to_master(cfg, &extraction.records)?;
    if delta.is_empty() {
        info!("No changes detected");
        return Ok(());
    }
    info!(
        "Adds: {}, removes: {}",
        delta.added.len(),
        delta.removed.len()
    );

    let summary = summary::generate_summary(cfg, &delta).await;
    if summary.is_empty() {
        warn!("No summary generated");
        return Ok(());
    }

    info!("Notification summary:\n{summary}");
    notify::send_telegram(cfg, &summary).await;
    Ok(())
}

fn extract_one(file: &Path) -> Result<()> {
    let grid = xlsx::load_grid(file)?;
    let date_added = record::date_from_path(file).unwrap_or_else(|| Local::now().date_naive());
    let extraction = extract::extract(&grid, date_added)?;

    println!(
        "{:>8} | {:<40} | {:>6} | {:>10} | {:<4} | {}",
        "CODE", "Brand", "Proof", "List $", "ADA", "Category"
    );
    println!("{}", "-".repeat(100));
    for r in &extraction.records {
        println!(
            "{:>8} | {:<40} | {:>6} | {:>10} | {:<4} | {}",
            r.code,
            truncate(&r.brand, 40),
            r.proof.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            r.list_price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "-".into()),
            r.ada,
            r.category.as_deref().unwrap_or("-"),
        );
    }

    println!(
        "\n{} record(s), {} skipped row(s)",
        extraction.records.len(),
        extraction.skipped.len()
    );
    for skip in &extraction.skipped {
        println!("  row {}: {:?}", skip.row + 1, skip.reason);
    }
    Ok(())
}

fn stats(cfg: &Config) -> Result<()> {
    let seen = if cfg.seen_links_file.exists() {
        state::load_seen_links(cfg)?.len()
    } else {
        0
    };
    println!("Seen links: {}", seen);

    match state::load_master(&cfg.master_file)? {
        Some(master) => println!("Master snapshot: {} record(s)", master.len()),
        None => println!("Master snapshot: none yet"),
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
