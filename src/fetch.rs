use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::config::Config;

// The upstream host serves 403s to bare clients.
const USER_AGENT: &str = "Mozilla/5.0";

/// Download a price book into the download directory. Already-present files
/// are reused rather than re-fetched.
pub async fn download_file(client: &reqwest::Client, cfg: &Config, url: &str) -> Result<PathBuf> {
    let path = cfg.download_dir.join(basename(url)?);
    if path.exists() {
        info!("Already downloaded: {}", path.display());
        return Ok(path);
    }

    info!("Downloading: {}", url);
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::REFERER, cfg.page_url.as_str())
        .send()
        .await?
        .error_for_status()?;
    let bytes = response.bytes().await?;
    std::fs::write(&path, &bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Filename portion of a URL, query string stripped.
fn basename(url: &str) -> Result<&str> {
    let no_query = url.split('?').next().unwrap_or(url);
    no_query
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("no filename in url: {url}"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_path_and_query() {
        let url = "https://www.michigan.gov/docs/book-4-15-25.xlsx?rev=abc123";
        assert_eq!(basename(url).unwrap(), "book-4-15-25.xlsx");
    }

    #[test]
    fn basename_without_query() {
        assert_eq!(
            basename("https://host.test/a/b/book.xlsx").unwrap(),
            "book.xlsx"
        );
    }

    #[test]
    fn trailing_slash_has_no_filename() {
        assert!(basename("https://host.test/docs/").is_err());
    }
}
