use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the API server binds on.
    pub listen: String,
    /// Path of the persisted jobs file.
    pub jobs_file: String,
    /// Directory with newline-delimited `.txt` wordlists, loaded at startup.
    pub wordlist_dir: String,
    /// Probes per second, shared across all running jobs.
    pub rate_limit: f64,
    /// Per-request probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Bulk-checkpoint the job store every N wordlist entries.
    pub checkpoint_interval: usize,
    /// How many levels of follow-up jobs a subdomain discovery may spawn.
    pub max_recursion_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            jobs_file: "jobs.json".to_string(),
            wordlist_dir: "wordlists".to_string(),
            rate_limit: 10.0,
            probe_timeout_secs: 10,
            checkpoint_interval: 100,
            max_recursion_depth: 3,
        }
    }
}
