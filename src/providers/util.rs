use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use std::time::Duration;

pub const USER_AGENT: &str = "etfdesk/0.1";

/// Builds a client with the shared user agent and per-request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Appends `segments` to the path of `base_url` and `params` as a query string.
///
/// Each segment is percent-encoded, so a symbol can never add path segments or a query.
pub fn build_url(base_url: &str, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid URL: {base_url}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("URL cannot take a path: {base_url}"))?
        .pop_if_empty()
        .extend(segments);
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// Parses provider numbers that may arrive as strings like `"0.03%"` or `"None"`.
pub fn safe_float(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() || value == "None" || value == "-" {
        return None;
    }
    value.strip_suffix('%').unwrap_or(value).trim().parse().ok()
}
