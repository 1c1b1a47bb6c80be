use thiserror::Error;

use crate::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic, decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_fraction = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} is outside [0.0, 1.0]"),
            });
        }
        Ok(value)
    };

    let summarizer_api_key = require("GITPULSE_SUMMARIZER_API_KEY")?;

    let bind_addr = parse_addr("GITPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GITPULSE_LOG_LEVEL", "info");
    let db_path = PathBuf::from(or_default("GITPULSE_DB_PATH", "./data/gitpulse.db"));

    let trend_index_base_url = or_default(
        "GITPULSE_TREND_INDEX_BASE_URL",
        "https://api.ossinsight.io",
    );
    let trend_index_token = lookup("GITPULSE_TREND_INDEX_TOKEN")
        .ok()
        .filter(|s| !s.is_empty());

    let summarizer_base_url = or_default(
        "GITPULSE_SUMMARIZER_BASE_URL",
        "https://api.deepseek.com",
    );
    let summarizer_model = or_default("GITPULSE_SUMMARIZER_MODEL", "deepseek-chat");
    let summary_language = or_default("GITPULSE_SUMMARY_LANGUAGE", "English");

    let language_threshold = parse_fraction("LANGUAGE_THRESHOLD", "0.2")?;

    let request_timeout_secs = parse_u64("GITPULSE_REQUEST_TIMEOUT_SECS", "30")?;
    let collect_workers = parse_usize("GITPULSE_COLLECT_WORKERS", "4")?;
    let max_repos = parse_usize("GITPULSE_MAX_REPOS", "50")?;
    let max_retries = parse_u32("GITPULSE_MAX_RETRIES", "3")?;
    let retry_base_delay_ms = parse_u64("GITPULSE_RETRY_BASE_DELAY_MS", "1000")?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        db_path,
        trend_index_base_url,
        trend_index_token,
        summarizer_base_url,
        summarizer_api_key,
        summarizer_model,
        summary_language,
        language_threshold,
        request_timeout_secs,
        collect_workers,
        max_repos,
        max_retries,
        retry_base_delay_ms,
    })
}
