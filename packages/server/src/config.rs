use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Default Google Generative Language endpoint
pub const DEFAULT_EMBEDDING_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// Vector width stored in `posts.embedding` (see migrations)
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Settings for the remote embedding client
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// `None` is not a startup error; every embed call reports it instead
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub dimensions: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_url: DEFAULT_EMBEDDING_API_URL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub embedding: EmbeddingConfig,
    /// Maximum number of embedding pipeline runs in flight
    pub embedding_workers: usize,
    /// Number of search results when the caller doesn't ask for a limit
    pub search_result_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = EmbeddingConfig::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            embedding: EmbeddingConfig {
                api_key: env::var("GOOGLE_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                model: env::var("EMBEDDING_MODEL").unwrap_or(defaults.model),
                api_url: env::var("EMBEDDING_API_URL").unwrap_or(defaults.api_url),
                dimensions: parse_var("EMBEDDING_DIMENSIONS", defaults.dimensions)?,
                timeout: Duration::from_secs(parse_var("EMBEDDING_TIMEOUT_SECS", 30)?),
            },
            embedding_workers: parse_var("EMBEDDING_WORKERS", 4)?,
            search_result_limit: parse_var("SEARCH_RESULT_LIMIT", 2)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_defaults_match_schema() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.model, "gemini-embedding-001");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: usize = parse_var("FORUM_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
