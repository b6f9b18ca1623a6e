use std::time::Duration;

use anyhow::{anyhow, Result};
use serde_json::json;

use crate::config::Config;
use crate::delta::Delta;
use crate::record::ProductRecord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_LISTED: usize = 5;

/// Turn a delta into notification prose via the configured model endpoint.
///
/// Never propagates an error past this boundary: a failed model call becomes
/// an error string inside the returned text, and an empty delta section just
/// contributes nothing. An all-empty result means no message should be sent.
pub async fn generate_summary(cfg: &Config, delta: &Delta) -> String {
    let mut prompts = Vec::new();

    if !delta.added.is_empty() {
        prompts.push(format!(
            "Write a clever and engaging summary about these *new whiskeys* as if \
             it's a mixtape just dropped. Use emojis and cool slang. Keep it fun \
             and simple. Must include price.\n\n### New Whiskeys:\n{}",
            format_records(&delta.added)
        ));
    }
    if !delta.removed.is_empty() {
        prompts.push(format!(
            "Write a heartfelt eulogy for these *discontinued whiskeys*. Make it \
             poetic and nostalgic.\n\n### Discontinued Whiskeys:\n{}",
            format_records(&delta.removed)
        ));
    }

    let mut responses = Vec::new();
    for prompt in prompts {
        match call_model(cfg, &prompt).await {
            Ok(text) => responses.push(text),
            Err(e) => responses.push(format!("Error calling model API: {e}")),
        }
    }
    responses.join("\n\n---\n\n")
}

async fn call_model(cfg: &Config, prompt: &str) -> Result<String> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let response = client
        .post(format!("{}/api/generate", cfg.ai_host))
        .json(&json!({ "model": cfg.ai_model, "prompt": prompt, "stream": false }))
        .send()
        .await?
        .error_for_status()?;

    let body: serde_json::Value = response.json().await?;
    body.get("response")
        .and_then(|r| r.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no response field in model output"))
}

/// Plain-text table of the first few records for prompt context.
fn format_records(records: &[ProductRecord]) -> String {
    let mut lines = vec!["CODE | Brand | Proof | List Price | Category".to_string()];
    for r in records.iter().take(MAX_LISTED) {
        lines.push(format!(
            "{} | {} | {} | {} | {}",
            r.code,
            r.brand,
            r.proof.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            r.list_price
                .map(|p| format!("${p:.2}"))
                .unwrap_or_else(|| "-".into()),
            r.category.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

// ── Tests ──
