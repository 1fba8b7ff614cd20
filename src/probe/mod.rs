pub mod client;
pub mod directory;
pub mod vhost;

pub use client::ProbeClient;
