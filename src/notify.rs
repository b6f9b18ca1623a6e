use serde_json::json;
use tracing::{error, info, warn};

use crate::config::Config;

/// Deliver a notification over the Telegram bot API. Missing credentials or
/// delivery failures are logged, never escalated.
pub async fn send_telegram(cfg: &Config, text: &str) {
    let (Some(token), Some(chat_id)) = (&cfg.telegram_token, &cfg.telegram_chat_id) else {
        warn!("Telegram credentials not configured; skipping notification");
        return;
    };

    let url = format!("https://api.telegram.org/bot{token}/sendMessage");
    let result = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "chat_id": chat_id, "text": text }))
        .send()
        .await
        .and_then(|r| r.error_for_status());

    match result {
        Ok(_) => info!("Telegram message sent"),
        Err(e) => error!("Telegram delivery failed: {e}"),
    }
}
