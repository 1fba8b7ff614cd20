use reqwest::StatusCode;

use super::client::ProbeClient;

/// Fetch `target/word`. 200 and 403 both count as an existing resource;
/// every other status and any network error is a silent miss.
pub async fn check(client: &ProbeClient, target: &str, word: &str) -> Option<String> {
    let url = format!("{}/{}", target.trim_end_matches('/'), word);
    let resp = match client.follow.get(url.as_str()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(%url, error = %e, "directory probe failed");
            return None;
        }
    };
    match resp.status() {
        StatusCode::OK | StatusCode::FORBIDDEN => Some(url),
        _ => None,
    }
}
