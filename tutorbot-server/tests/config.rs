use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::ExposeSecret;
use tutorbot_server::{ConfigError, EmbeddingProvider, ServerConfig};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_when_only_the_key_is_set() {
    let config = ServerConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "secret")])).unwrap();

    assert_eq!(config.api_key.expose_secret(), "secret");
    assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.port, 8000);
    assert_eq!(config.model, "gemini-2.5-flash-lite");
    assert_eq!(config.embedding_provider, EmbeddingProvider::Google);
    assert_eq!(config.embedding_dimension, 768);
    assert_eq!(config.corpus_dir, PathBuf::from("./data"));
    assert_eq!(config.top_k, 4);
    assert_eq!(config.router_max_retries, 3);
    assert_eq!(config.python, "python3");
    assert_eq!(config.python_timeout, Duration::from_secs(10));
    assert_eq!(config.max_concurrency, 64);
    assert_eq!(config.request_timeout, Duration::from_secs(120));
}

#[test]
fn missing_api_key_is_an_error() {
    let err = ServerConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "  ")])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("GOOGLE_API_KEY")));
}

#[test]
fn overrides_are_parsed() {
    let config = ServerConfig::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "secret"),
        ("TUTORBOT_HOST", "127.0.0.1"),
        ("TUTORBOT_PORT", "9100"),
        ("TUTORBOT_EMBEDDING_PROVIDER", "Hash"),
        ("TUTORBOT_EMBEDDING_DIM", "64"),
        ("TUTORBOT_CORPUS_DIR", "/srv/docs"),
        ("TUTORBOT_TOP_K", "2"),
        ("TUTORBOT_ROUTER_MAX_RETRIES", "0"),
        ("TUTORBOT_PYTHON_TIMEOUT_SECS", "3"),
        ("TUTORBOT_REQUEST_TIMEOUT_SECS", "45"),
    ]))
    .unwrap();

    assert_eq!(config.addr().to_string(), "127.0.0.1:9100");
    assert_eq!(config.embedding_provider, EmbeddingProvider::Hash);
    assert_eq!(config.embedding_dimension, 64);
    assert_eq!(config.corpus_dir, PathBuf::from("/srv/docs"));
    assert_eq!(config.top_k, 2);
    assert_eq!(config.router_max_retries, 0);
    assert_eq!(config.python_timeout, Duration::from_secs(3));
    assert_eq!(config.request_timeout, Duration::from_secs(45));
}

#[test]
fn zero_request_timeout_is_rejected() {
    let err = ServerConfig::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "secret"),
        ("TUTORBOT_REQUEST_TIMEOUT_SECS", "0"),
    ]))
    .unwrap_err();

    assert!(matches!(err, ConfigError::Invalid { key: "TUTORBOT_REQUEST_TIMEOUT_SECS", .. }));
}

#[test]
fn invalid_numbers_name_the_variable() {
    let err = ServerConfig::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "secret"),
        ("TUTORBOT_PORT", "eighty"),
    ]))
    .unwrap_err();

    match err {
        ConfigError::Invalid { key, value, .. } => {
            assert_eq!(key, "TUTORBOT_PORT");
            assert_eq!(value, "eighty");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_top_k_is_rejected() {
    let err = ServerConfig::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "secret"),
        ("TUTORBOT_TOP_K", "0"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "TUTORBOT_TOP_K", .. }));
}

#[test]
fn unknown_embedding_provider_is_rejected() {
    let err = ServerConfig::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "secret"),
        ("TUTORBOT_EMBEDDING_PROVIDER", "openai"),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("openai"));
}
