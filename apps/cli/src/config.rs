use std::path::PathBuf;

use anyhow::Result;

const DEFAULT_API_URL: &str = "https://api.hh.ru";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_CREDENTIALS_FILE: &str = ".env";
const DEFAULT_LOG_DIR: &str = "logs";

/// Process configuration loaded from environment variables (with `.env`
/// loaded first, which doubles as the credential file by default).
#[derive(Debug, Clone)]
pub struct Config {
    /// KEY=VALUE file holding the client identity and token pair.
    pub credentials_file: PathBuf,
    pub api_base_url: String,
    pub telegram_api_url: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub log_dir: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            credentials_file: PathBuf::from(env_or(
                "CREDENTIALS_FILE",
                DEFAULT_CREDENTIALS_FILE,
            )),
            api_base_url: env_or("HH_API_URL", DEFAULT_API_URL),
            telegram_api_url: env_or("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL),
            telegram_token: require_env("TELEGRAM_TOKEN")?,
            telegram_chat_id: require_env("TELEGRAM_CHAT_ID")?,
            log_dir: env_or("LOG_DIR", DEFAULT_LOG_DIR),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    use anyhow::Context;
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
