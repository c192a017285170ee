// SPDX-License-Identifier: GPL-3.0-only
use url::Url;
use anyhow::{Result, Context};

/// Maximum allowed URL length
const MAX_URL_LENGTH: usize = 2048;

/// Validate a WebSocket endpoint URL (ws or wss)
pub fn validate_ws_url(url_str: &str) -> Result<Url> {
    validate_with_schemes(url_str, &["ws", "wss"])
}

/// Validate an HTTP endpoint URL (http or https)
pub fn validate_http_url(url_str: &str) -> Result<Url> {
    validate_with_schemes(url_str, &["http", "https"])
}

/// Checks:
/// - URL length
/// - URL parses
/// - scheme is one of `schemes`
/// - a host is present
fn validate_with_schemes(url_str: &str, schemes: &[&str]) -> Result<Url> {
    if url_str.len() > MAX_URL_LENGTH {
        return Err(anyhow::anyhow!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH));
    }

    let url = Url::parse(url_str)
        .context("Invalid URL format")?;

    if !schemes.contains(&url.scheme()) {
        return Err(anyhow::anyhow!(
            "Invalid URL scheme: {} (only {} allowed)",
            url.scheme(),
            schemes.join(" and ")
        ));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(anyhow::anyhow!("URL must have a host")),
    }

    Ok(url)
}
