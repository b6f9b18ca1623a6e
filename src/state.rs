//! Persisted run state: the seen-links set and the master snapshot.
//!
//! Both files are whole-file replace on save. The master snapshot keeps the
//! exact column set `CODE, Brand, Proof, List Price, ADA, Category,
//! Date Added`, one row per record.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::delta::{self, Delta};
use crate::record::ProductRecord;

/// Create the download directory and seed an empty seen-links file.
pub fn ensure_dirs(cfg: &Config) -> Result<()> {
    fs::create_dir_all(&cfg.download_dir)
        .with_context(|| format!("create {}", cfg.download_dir.display()))?;
    if !cfg.seen_links_file.exists() {
        fs::write(&cfg.seen_links_file, "[]")?;
    }
    Ok(())
}

pub fn load_seen_links(cfg: &Config) -> Result<HashSet<String>> {
    let raw = fs::read_to_string(&cfg.seen_links_file)
        .with_context(|| format!("read {}", cfg.seen_links_file.display()))?;
    let links: Vec<String> = serde_json::from_str(&raw)?;
    Ok(links.into_iter().collect())
}

/// Full-replace save, sorted and pretty-printed so the file diffs cleanly.
pub fn save_seen_links(cfg: &Config, links: &HashSet<String>) -> Result<()> {
    let mut sorted: Vec<&String> = links.iter().collect();
    sorted.sort();
    fs::write(&cfg.seen_links_file, serde_json::to_string_pretty(&sorted)?)?;
    Ok(())
}

/// Load the last-known-good snapshot; `None` before the first successful run.
pub fn load_master(path: &Path) -> Result<Option<Vec<ProductRecord>>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(Some(records))
}

/// Full-replace write of the master snapshot.
pub fn save_master(path: &Path, records: &[ProductRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Diff newly extracted records against the master snapshot, then commit the
/// new records as the snapshot (full replace, even when the delta is empty).
///
/// An empty extraction yields an empty delta and leaves the snapshot alone,
/// so a parse failure can never erase known-good state.
pub fn compare_to_master(cfg: &Config, new: &[ProductRecord]) -> Result<Delta> {
    if new.is_empty() {
        return Ok(Delta::default());
    }

    let delta = match load_master(&cfg.master_file)? {
        None => {
            info!("No master snapshot yet; all {} record(s) count as added", new.len());
            Delta {
                added: new.to_vec(),
                removed: Vec::new(),
            }
        }
        Some(master) => delta::diff(new, &master),
    };

    save_master(&cfg.master_file, new)?;
    Ok(delta)
}

// ── Tests ──
