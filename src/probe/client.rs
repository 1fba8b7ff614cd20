use std::time::Duration;

use reqwest::{Client, ClientBuilder};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The two HTTP clients the probe strategies share. Directory checks may
/// follow redirects; virtual-host checks must not, since redirect targets
/// can leak unrelated hosts.
pub struct ProbeClient {
    pub(crate) follow: Client,
    pub(crate) no_redirect: Client,
}

impl ProbeClient {
    pub fn new(timeout_secs: u64) -> anyhow::Result<Self> {
        let follow = base_builder(timeout_secs)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        let no_redirect = base_builder(timeout_secs)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { follow, no_redirect })
    }
}

fn base_builder(timeout_secs: u64) -> ClientBuilder {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(5)))
        .tcp_nodelay(true)
        .use_rustls_tls()
        // Targets under enumeration routinely serve self-signed certs.
        .danger_accept_invalid_certs(true)
        .user_agent(USER_AGENT)
}
