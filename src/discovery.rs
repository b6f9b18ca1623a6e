//! Link discovery: render the price book page and collect Excel links.
//!
//! The listing page is built client-side, so a plain GET sees none of the
//! links. We render it through spider.cloud and scan the returned markdown
//! for anchors whose text marks an Excel price book.

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::info;

use crate::config::Config;

/// Markdown links: `[anchor text](url)`.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap());

const LINK_TEXT_SUFFIX: &str = "price book (excel)";

/// Render the configured page and return every Excel price book URL on it.
/// Failure here is fatal for the run: no links means no work.
pub async fn find_price_book_links(cfg: &Config) -> Result<HashSet<String>> {
    let api_key = cfg
        .spider_api_key
        .clone()
        .ok_or_else(|| anyhow!("SPIDER_API_KEY must be set for link discovery"))?;
    let spider = Spider::new(Some(api_key)).map_err(|e| anyhow!("spider client: {e}"))?;

    let params = RequestParams {
        return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Markdown)),
        ..Default::default()
    };

    info!("Rendering price book page: {}", cfg.page_url);
    let response = spider
        .scrape_url(&cfg.page_url, Some(params), "application/json")
        .await
        .map_err(|e| anyhow!("page render failed: {e}"))?;

    let parsed: serde_json::Value = match response.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
        None => response,
    };

    let markdown = parsed
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("no content in render response"))?;

    let links = extract_price_book_links(markdown, &cfg.page_url);
    info!("Found {} price book link(s)", links.len());
    Ok(links)
}

/// Pull out links whose anchor text marks an Excel price book, absolutizing
/// site-relative hrefs against the page origin.
fn extract_price_book_links(markdown: &str, page_url: &str) -> HashSet<String> {
    let origin = origin_of(page_url);
    LINK_RE
        .captures_iter(markdown)
        .filter(|caps| caps[1].trim().to_lowercase().ends_with(LINK_TEXT_SUFFIX))
        .filter_map(|caps| absolutize(&caps[2], origin.as_deref()))
        .collect()
}

/// `scheme://host` portion of a URL.
fn origin_of(url: &str) -> Option<String> {
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i)
        .unwrap_or(url.len());
    Some(url[..host_end].to_string())
}

fn absolutize(href: &str, origin: Option<&str>) -> Option<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else if href.starts_with('/') {
        origin.map(|o| format!("{o}{href}"))
    } else {
        None
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.michigan.gov/lara/bureau-list/lcc/spirits-price-book-info";

    #[test]
    fn matches_anchor_text_case_insensitively() {
        let md = "\
Some intro text.
[April 2025 Price Book (Excel)](https://www.michigan.gov/docs/book-4-15-25.xlsx)
[April 2025 Price Book (PDF)](https://www.michigan.gov/docs/book-4-15-25.pdf)
[Contact us](https://www.michigan.gov/contact)";
        let links = extract_price_book_links(md, PAGE);
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://www.michigan.gov/docs/book-4-15-25.xlsx"));
    }

    #[test]
    fn relative_hrefs_are_absolutized() {
        let md = "[May Price Book (Excel)](/docs/book-5-1-25.xlsx)";
        let links = extract_price_book_links(md, PAGE);
        assert!(links.contains("https://www.michigan.gov/docs/book-5-1-25.xlsx"));
    }

    #[test]
    fn duplicate_links_collapse_to_one() {
        let md = "\
[Price Book (Excel)](https://www.michigan.gov/docs/book.xlsx)
[price book (excel)](https://www.michigan.gov/docs/book.xlsx)";
        assert_eq!(extract_price_book_links(md, PAGE).len(), 1);
    }

    #[test]
    fn origin_parsing() {
        assert_eq!(
            origin_of(PAGE).as_deref(),
            Some("https://www.michigan.gov")
        );
        assert_eq!(
            origin_of("https://host.test").as_deref(),
            Some("https://host.test")
        );
        assert_eq!(origin_of("not a url"), None);
    }
}
