use thiserror::Error;

/// Errors the job engine surfaces to callers. Anything that happens *during*
/// a run is absorbed into the job's own status or a negative probe result.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("wordlist not found: {0}")]
    WordlistNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("persistence failure: {0}")]
    Persistence(anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
