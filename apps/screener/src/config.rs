use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numeric values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub uploads_dir: PathBuf,
    pub jobdesc_dir: PathBuf,
    pub scorer: ScorerConfig,
    pub max_upload_bytes: usize,
}

/// How the external scoring program is launched.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            uploads_dir: PathBuf::from(env_or("UPLOADS_DIR", "uploads")),
            jobdesc_dir: PathBuf::from(env_or("JOBDESC_DIR", "jobdesc")),
            scorer: ScorerConfig {
                program: env_or("SCORER_PROGRAM", "python"),
                args: split_args(&env_or("SCORER_ARGS", "next.py")),
                workdir: PathBuf::from(env_or("SCORER_WORKDIR", ".")),
                timeout: Duration::from_secs(parse_env("SCORER_TIMEOUT_SECS", 300)?),
            },
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(String::from).collect()
}
