use reqwest::header;
use url::Url;

use super::client::ProbeClient;

/// How much of a response body is worth inspecting for the heuristic.
const BODY_CAP: usize = 1024;
/// Error pages larger than this look like a real site, not a catch-all.
const MIN_ERROR_BODY: usize = 512;

/// Check whether `word.<authority-of-target>` is served as a virtual host.
///
/// The label keeps the target's port, so a service on a non-default port is
/// matched (and later re-probed) port-qualified. The request goes to the
/// original authority with the `Host` header overridden, trying plain HTTP
/// before HTTPS, and never follows redirects. Timeouts and connection errors
/// are negatives, not failures.
pub async fn check(client: &ProbeClient, target: &str, word: &str) -> Option<String> {
    let parsed = Url::parse(target).ok()?;
    let host = parsed.host_str()?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let vhost = format!("{word}.{authority}");

    for scheme in ["http", "https"] {
        let base = format!("{scheme}://{authority}");
        let resp = client
            .no_redirect
            .get(base.as_str())
            .header(header::HOST, vhost.as_str())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(%vhost, scheme, error = %e, "vhost probe failed");
                continue;
            }
        };

        let status = resp.status().as_u16();
        let body_len = read_capped(resp, BODY_CAP).await;
        if is_likely_valid_vhost(status, body_len) {
            return Some(format!("{scheme}://{vhost}"));
        }
    }

    None
}

/// Read at most `cap` body bytes and report how many arrived.
async fn read_capped(mut resp: reqwest::Response, cap: usize) -> usize {
    let mut read = 0;
    while let Ok(Some(chunk)) = resp.chunk().await {
        read += chunk.len();
        if read >= cap {
            return cap;
        }
    }
    read
}

/// Heuristic for "this virtual host actually exists". Success codes and
/// auth walls are positives; a 404/500 with a substantial body is probably
/// a real site's custom error page rather than a default catch-all.
fn is_likely_valid_vhost(status: u16, body_len: usize) -> bool {
    if (200..400).contains(&status) {
        return true;
    }
    if status == 401 || status == 403 {
        return true;
    }
    (status == 404 || status == 500) && body_len > MIN_ERROR_BODY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_auth_codes_are_positive() {
        assert!(is_likely_valid_vhost(200, 0));
        assert!(is_likely_valid_vhost(301, 0));
        assert!(is_likely_valid_vhost(399, 0));
        assert!(is_likely_valid_vhost(401, 0));
        assert!(is_likely_valid_vhost(403, 0));
    }

    #[test]
    fn error_pages_need_substantial_bodies() {
        assert!(!is_likely_valid_vhost(404, 512));
        assert!(is_likely_valid_vhost(404, 513));
        assert!(!is_likely_valid_vhost(500, 100));
        assert!(is_likely_valid_vhost(500, 1024));
    }

    #[test]
    fn other_codes_are_negative() {
        assert!(!is_likely_valid_vhost(400, 4096));
        assert!(!is_likely_valid_vhost(418, 4096));
        assert!(!is_likely_valid_vhost(503, 4096));
    }
}
