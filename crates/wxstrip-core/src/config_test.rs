use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_client_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_client_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.request_timeout_ms, 12_000);
    assert_eq!(cfg.probe_timeout_ms, 8_000);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_initial_delay_ms, 1_000);
    assert_eq!(cfg.proxy_prefix, "https://corsproxy.io/?");
}

#[test]
fn build_client_config_accepts_overrides() {
    let mut map = HashMap::new();
    map.insert("WXSTRIP_API_BASE_URL", "http://127.0.0.1:9000/api/");
    map.insert("WXSTRIP_PROXY_PREFIX", "");
    map.insert("WXSTRIP_MIRROR_PREFIXES", "https://a.example/?u=, ,https://b.example/");
    map.insert("WXSTRIP_REQUEST_TIMEOUT_MS", "3000");
    map.insert("WXSTRIP_MAX_RETRIES", "5");
    map.insert("WXSTRIP_RETRY_JITTER", "0.25");
    map.insert("WXSTRIP_IMAGE_NOT_FOUND", "terminal");
    let cfg = build_client_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:9000/api/");
    assert_eq!(cfg.proxy_prefix, "");
    assert_eq!(
        cfg.mirror_prefixes,
        ["https://a.example/?u=", "https://b.example/"]
    );
    assert_eq!(cfg.request_timeout_ms, 3_000);
    assert_eq!(cfg.max_retries, 5);
    assert!((cfg.retry_jitter - 0.25).abs() < f64::EPSILON);
    assert_eq!(cfg.image_not_found, NotFoundPolicy::Terminal);
    assert_eq!(cfg.alpha_not_found, NotFoundPolicy::Retry);
}

#[test]
fn build_client_config_rejects_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("WXSTRIP_REQUEST_TIMEOUT_MS", "soon");
    let result = build_client_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WXSTRIP_REQUEST_TIMEOUT_MS"),
        "expected InvalidEnvVar(WXSTRIP_REQUEST_TIMEOUT_MS), got: {result:?}"
    );
}

#[test]
fn build_client_config_rejects_zero_probe_timeout() {
    let mut map = HashMap::new();
    map.insert("WXSTRIP_PROBE_TIMEOUT_MS", "0");
    let result = build_client_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WXSTRIP_PROBE_TIMEOUT_MS"),
        "expected InvalidEnvVar(WXSTRIP_PROBE_TIMEOUT_MS), got: {result:?}"
    );
}

#[test]
fn build_client_config_rejects_out_of_range_jitter() {
    let mut map = HashMap::new();
    map.insert("WXSTRIP_RETRY_JITTER", "1.5");
    let result = build_client_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WXSTRIP_RETRY_JITTER"),
        "expected InvalidEnvVar(WXSTRIP_RETRY_JITTER), got: {result:?}"
    );
}

#[test]
fn build_client_config_rejects_unknown_not_found_policy() {
    let mut map = HashMap::new();
    map.insert("WXSTRIP_ALPHA_NOT_FOUND", "ignore");
    let result = build_client_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WXSTRIP_ALPHA_NOT_FOUND"),
        "expected InvalidEnvVar(WXSTRIP_ALPHA_NOT_FOUND), got: {result:?}"
    );
}

#[test]
fn build_client_config_rejects_non_http_base_url() {
    let mut map = HashMap::new();
    map.insert("WXSTRIP_API_BASE_URL", "ftp://example.com/");
    let result = build_client_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WXSTRIP_API_BASE_URL"),
        "expected InvalidEnvVar(WXSTRIP_API_BASE_URL), got: {result:?}"
    );
}
