use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How scrape jobs are routed on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointStyle {
    /// `POST /google`, `POST /trustpilot`.
    #[default]
    PerPlatform,
    /// `POST /process/` with a `platform` form field.
    Unified,
}

impl std::fmt::Display for EndpointStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointStyle::PerPlatform => write!(f, "per-platform"),
            EndpointStyle::Unified => write!(f, "unified"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub api_url: url::Url,
    pub log_level: String,
    pub endpoint_style: EndpointStyle,
    pub scrape_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub auth_poll_interval_ms: u64,
    pub auth_timeout_secs: u64,
    pub download_dir: PathBuf,
    pub user_agent: String,
}
