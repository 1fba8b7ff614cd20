use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use busterd::api::{self, AppState};
use busterd::config::Config;
use busterd::jobs::manager::{JobManager, JobManagerOptions};
use busterd::probe::ProbeClient;
use busterd::storage::FileJobStore;
use busterd::wordlist::{WordlistManager, WordlistProvider};

use crate::cli::Cli;

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Configure logging based on global flags. Keep external crates
    // (reqwest/hyper) at INFO to avoid flooding the log in debug mode.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!("busterd={crate_level},reqwest=info,hyper=info,h2=info");
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    let config = Config {
        listen: cli.listen,
        jobs_file: cli.jobs_file,
        wordlist_dir: cli.wordlists,
        rate_limit: cli.rate,
        probe_timeout_secs: cli.timeout,
        max_recursion_depth: cli.max_depth,
        ..Config::default()
    };

    let store = Arc::new(FileJobStore::open(&config.jobs_file)?);
    let wordlists = Arc::new(WordlistManager::new());
    let loaded = wordlists.load_dir(Path::new(&config.wordlist_dir))?;
    tracing::info!(count = loaded, dir = %config.wordlist_dir, "loaded wordlists");

    let shutdown = CancellationToken::new();
    let client = ProbeClient::new(config.probe_timeout_secs)?;
    let manager = JobManager::new(
        store,
        Arc::clone(&wordlists) as Arc<dyn WordlistProvider>,
        client,
        shutdown.clone(),
        JobManagerOptions {
            rate_limit: config.rate_limit,
            checkpoint_interval: config.checkpoint_interval,
            max_recursion_depth: config.max_recursion_depth,
        },
    );

    let app = api::router(AppState { manager, wordlists });
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!(addr = %config.listen, "listening");

    let shutdown_signal = {
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received, cancelling running jobs");
            shutdown.cancel();
        }
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;
    Ok(())
}
