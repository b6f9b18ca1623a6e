use std::env;
use std::path::PathBuf;

const DEFAULT_PAGE_URL: &str =
    "https://www.michigan.gov/lara/bureau-list/lcc/spirits-price-book-info";

/// Runtime settings, read from the environment once at startup and passed
/// down by reference. Components never touch the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page listing the published price books.
    pub page_url: String,
    pub download_dir: PathBuf,
    pub master_file: PathBuf,
    pub seen_links_file: PathBuf,
    /// Ollama-compatible endpoint used for summary generation.
    pub ai_host: String,
    pub ai_model: String,
    pub spider_api_key: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            page_url: env_or("PAGE_URL", DEFAULT_PAGE_URL),
            download_dir: env_or("DOWNLOAD_DIR", "./downloads").into(),
            master_file: env_or("MASTER_FILE", "master_list.csv").into(),
            seen_links_file: env_or("SEEN_LINKS_FILE", "seen_links.json").into(),
            ai_host: env_or("AI_NODE_ADDRESS", "http://127.0.0.1:11434"),
            ai_model: env_or("AI_MODEL", "mistral"),
            spider_api_key: env::var("SPIDER_API_KEY").ok(),
            telegram_token: env::var("TELEGRAM_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
