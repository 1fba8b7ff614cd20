use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod manager;

/// Which probe strategy a job applies to each wordlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Directory,
    Subdomain,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::Directory => f.write_str("directory"),
            JobType::Subdomain => f.write_str("subdomain"),
        }
    }
}

/// Job lifecycle states. `Running` is the only non-terminal state; a job
/// never re-enters it once stopped, completed or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Stopped,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => f.write_str("running"),
            JobStatus::Stopped => f.write_str("stopped"),
            JobStatus::Completed => f.write_str("completed"),
            JobStatus::Failed => f.write_str("failed"),
        }
    }
}

/// One positive detection recorded by a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: JobType,
    pub found: DateTime<Utc>,
}

/// One enumeration run against a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: JobType,
    pub wordlist_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub findings: Vec<Finding>,
    pub start_time: DateTime<Utc>,
}

impl Job {
    pub fn new(id: String, target: &str, wordlist_id: &str, kind: JobType) -> Self {
        Self {
            id,
            target: target.to_string(),
            kind,
            wordlist_id: wordlist_id.to_string(),
            status: JobStatus::Running,
            progress: 0,
            findings: Vec::new(),
            start_time: Utc::now(),
        }
    }
}
