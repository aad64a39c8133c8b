use crate::app_config::{AppConfig, EndpointStyle, Environment};
use crate::ConfigError;

/// Reads `.env` (if present) and then the `REVSCRAPE_*` variables.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Like [`load_app_config`] but only looks at the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Every setting has a default that `lookup` may override. Tests pass a map
/// lookup instead of touching the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            n => Ok(n),
        }
    };

    let env = parse_environment(&or_default("REVSCRAPE_ENV", "development"))?;
    let api_url = parse_api_url(&or_default("REVSCRAPE_API_URL", "http://127.0.0.1:8000"))?;
    let log_level = or_default("REVSCRAPE_LOG_LEVEL", "info");
    let endpoint_style =
        parse_endpoint_style(&or_default("REVSCRAPE_ENDPOINT_STYLE", "per-platform"))?;

    let scrape_timeout_secs = positive_u64("REVSCRAPE_SCRAPE_TIMEOUT_SECS", "900")?;
    let request_timeout_secs = positive_u64("REVSCRAPE_REQUEST_TIMEOUT_SECS", "30")?;
    let auth_poll_interval_ms = positive_u64("REVSCRAPE_AUTH_POLL_INTERVAL_MS", "1000")?;
    let auth_timeout_secs = positive_u64("REVSCRAPE_AUTH_TIMEOUT_SECS", "300")?;

    let download_dir = PathBuf::from(or_default("REVSCRAPE_DOWNLOAD_DIR", "."));
    let user_agent = or_default("REVSCRAPE_USER_AGENT", "revscrape/0.1");

    Ok(AppConfig {
        env,
        api_url,
        log_level,
        endpoint_style,
        scrape_timeout_secs,
        request_timeout_secs,
        auth_poll_interval_ms,
        auth_timeout_secs,
        download_dir,
        user_agent,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVSCRAPE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_endpoint_style(s: &str) -> Result<EndpointStyle, ConfigError> {
    match s {
        "per-platform" => Ok(EndpointStyle::PerPlatform),
        "unified" => Ok(EndpointStyle::Unified),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVSCRAPE_ENDPOINT_STYLE".to_string(),
            reason: format!("expected 'per-platform' or 'unified', got '{other}'"),
        }),
    }
}

fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "REVSCRAPE_API_URL".to_string(),
        reason,
    };
    let url = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
