use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub assistant_api_url: String,
    pub assistant_api_key: String,
    pub assistant_timeout_secs: u64,
    pub remote_draft_api_url: Option<String>,
    pub export_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            assistant_api_url: require_env("ASSISTANT_API_URL")?,
            assistant_api_key: require_env("ASSISTANT_API_KEY")?,
            assistant_timeout_secs: parse_env("ASSISTANT_TIMEOUT_SECS", 30)?,
            remote_draft_api_url: std::env::var("REMOTE_DRAFT_API_URL").ok(),
            export_timeout_secs: parse_env("EXPORT_TIMEOUT_SECS", 60)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a number of seconds")),
        Err(_) => Ok(default),
    }
}
