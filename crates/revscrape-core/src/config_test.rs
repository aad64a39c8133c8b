use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    vars: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| vars.get(key).map(ToString::to_string).ok_or(VarError::NotPresent)
}

#[test]
fn every_known_environment_parses() {
    for (raw, expected) in [
        ("development", Environment::Development),
        ("test", Environment::Test),
        ("production", Environment::Production),
    ] {
        assert_eq!(parse_environment(raw).ok(), Some(expected), "{raw}");
    }
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "REVSCRAPE_ENV"));
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.api_url.as_str(), "http://127.0.0.1:8000/");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.endpoint_style, EndpointStyle::PerPlatform);
    assert_eq!(cfg.scrape_timeout_secs, 900);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.auth_poll_interval_ms, 1000);
    assert_eq!(cfg.auth_timeout_secs, 300);
    assert_eq!(cfg.download_dir, std::path::PathBuf::from("."));
    assert_eq!(cfg.user_agent, "revscrape/0.1");
}

#[test]
fn api_url_override() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_API_URL", "https://scraper-backend.example.com");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.api_url.host_str(), Some("scraper-backend.example.com"));
}

#[test]
fn api_url_invalid() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_API_URL", "not a url");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVSCRAPE_API_URL"),
        "expected InvalidEnvVar(REVSCRAPE_API_URL), got: {result:?}"
    );
}

#[test]
fn api_url_rejects_non_http_scheme() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_API_URL", "ftp://example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn endpoint_style_unified() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_ENDPOINT_STYLE", "unified");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.endpoint_style, EndpointStyle::Unified);
}

#[test]
fn endpoint_style_invalid() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_ENDPOINT_STYLE", "both");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVSCRAPE_ENDPOINT_STYLE"),
        "expected InvalidEnvVar(REVSCRAPE_ENDPOINT_STYLE), got: {result:?}"
    );
}

#[test]
fn scrape_timeout_override() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_SCRAPE_TIMEOUT_SECS", "240");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.scrape_timeout_secs, 240);
}

#[test]
fn scrape_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_SCRAPE_TIMEOUT_SECS", "fifteen minutes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVSCRAPE_SCRAPE_TIMEOUT_SECS"),
        "expected InvalidEnvVar(REVSCRAPE_SCRAPE_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn zero_poll_interval_is_rejected() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_AUTH_POLL_INTERVAL_MS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVSCRAPE_AUTH_POLL_INTERVAL_MS"),
        "expected InvalidEnvVar(REVSCRAPE_AUTH_POLL_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn download_dir_and_user_agent_override() {
    let mut map = HashMap::new();
    map.insert("REVSCRAPE_DOWNLOAD_DIR", "/tmp/reviews");
    map.insert("REVSCRAPE_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.download_dir, std::path::PathBuf::from("/tmp/reviews"));
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
}
