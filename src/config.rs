use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// YAML/JSON list of `OAuthClient` objects backing client lookups.
    /// Set via AUTHTOKEN_CLIENTS_FILE.
    pub clients_file: Option<PathBuf>,
    /// `tracing` filter directive. Set via AUTHTOKEN_LOG, falling back to
    /// RUST_LOG. Default: `authorize_token=info`.
    pub log_filter: String,
    /// Set via AUTHTOKEN_LOG_FORMAT (`text` or `json`).
    pub log_format: LogFormat,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let log_format = match std::env::var("AUTHTOKEN_LOG_FORMAT") {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "" | "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => anyhow::bail!("AUTHTOKEN_LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        },
        Err(_) => LogFormat::Text,
    };

    Ok(Config {
        clients_file: std::env::var("AUTHTOKEN_CLIENTS_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from),
        log_filter: std::env::var("AUTHTOKEN_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "authorize_token=info".into()),
        log_format,
    })
}
