use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tutorbot_embeddings::{DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL};
use tutorbot_llm::DEFAULT_GEMINI_MODEL;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;
/// Wall-clock budget for one chat request, first-use indexing included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which embedder indexes and queries the corpus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    Google,
    /// Deterministic local embedder, no API calls.
    Hash,
}

impl FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "hash" => Ok(Self::Hash),
            other => Err(format!("unknown embedding provider '{other}', expected google or hash")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub api_key: SecretString,
    pub model: String,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub corpus_dir: PathBuf,
    pub index_path: PathBuf,
    pub top_k: usize,
    pub router_max_retries: u32,
    pub python: String,
    pub python_timeout: Duration,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            embedding_provider: EmbeddingProvider::Google,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            corpus_dir: PathBuf::from("./data"),
            index_path: PathBuf::from("./index/vectors.json"),
            top_k: tutorbot_agent::nodes::DEFAULT_TOP_K,
            router_max_retries: tutorbot_agent::nodes::DEFAULT_MAX_RETRIES,
            python: tutorbot_tools::DEFAULT_PYTHON_PROGRAM.to_string(),
            python_timeout: tutorbot_tools::DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset and blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("GOOGLE_API_KEY").ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?;
        let mut config = Self::new(SecretString::new(api_key));

        if let Some(value) = get("TUTORBOT_HOST") {
            config.host = parse("TUTORBOT_HOST", &value)?;
        }
        if let Some(value) = get("TUTORBOT_PORT") {
            config.port = parse("TUTORBOT_PORT", &value)?;
        }
        if let Some(value) = get("TUTORBOT_MODEL") {
            config.model = value;
        }
        if let Some(value) = get("TUTORBOT_EMBEDDING_PROVIDER") {
            config.embedding_provider = parse("TUTORBOT_EMBEDDING_PROVIDER", &value)?;
        }
        if let Some(value) = get("TUTORBOT_EMBEDDING_MODEL") {
            config.embedding_model = value;
        }
        if let Some(value) = get("TUTORBOT_EMBEDDING_DIM") {
            config.embedding_dimension = positive("TUTORBOT_EMBEDDING_DIM", &value)?;
        }
        if let Some(value) = get("TUTORBOT_CORPUS_DIR") {
            config.corpus_dir = PathBuf::from(value);
        }
        if let Some(value) = get("TUTORBOT_INDEX_PATH") {
            config.index_path = PathBuf::from(value);
        }
        if let Some(value) = get("TUTORBOT_TOP_K") {
            config.top_k = positive("TUTORBOT_TOP_K", &value)?;
        }
        if let Some(value) = get("TUTORBOT_ROUTER_MAX_RETRIES") {
            config.router_max_retries = parse("TUTORBOT_ROUTER_MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("TUTORBOT_PYTHON") {
            config.python = value;
        }
        if let Some(value) = get("TUTORBOT_PYTHON_TIMEOUT_SECS") {
            let secs: u64 = positive("TUTORBOT_PYTHON_TIMEOUT_SECS", &value)?;
            config.python_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = get("TUTORBOT_MAX_CONCURRENCY") {
            config.max_concurrency = positive("TUTORBOT_MAX_CONCURRENCY", &value)?;
        }
        if let Some(value) = get("TUTORBOT_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = positive("TUTORBOT_REQUEST_TIMEOUT_SECS", &value)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let parsed: T = parse(key, value)?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}
