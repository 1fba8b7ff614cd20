pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod limiter;
pub mod probe;
pub mod storage;
pub mod utils;
pub mod wordlist;
