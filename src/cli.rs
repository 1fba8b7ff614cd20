use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to bind the API server on
    #[arg(short = 'l', long, default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Path of the persisted jobs file
    #[arg(long, default_value = "jobs.json")]
    pub jobs_file: String,

    /// Directory with newline-delimited .txt wordlists, loaded at startup
    #[arg(short = 'w', long, default_value = "wordlists")]
    pub wordlists: String,

    /// Initial probe rate limit (probes per second)
    #[arg(short = 'r', long, default_value_t = 10.0)]
    pub rate: f64,

    /// Probe request timeout in seconds
    #[arg(long, default_value_t = 10_u64)]
    pub timeout: u64,

    /// Maximum levels of follow-up jobs spawned for discovered subdomains
    #[arg(long, default_value_t = 3_usize)]
    pub max_depth: usize,

    /// Enable detailed debug logging (global)
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
