use anyhow::Result;

use crate::error::PortalWatchError;

/// Configuration loaded from environment variables. Only secrets and model
/// overrides live here; store paths are CLI arguments so tests can point
/// each store at a temp directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Required for verification only. Merge, scoring, and dedup run without it.
    pub anthropic_api_key: Option<String>,
    /// Overrides the default oracle model.
    pub model: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("PORTALWATCH_MODEL").ok(),
        };

        config.log_keys();
        Ok(config)
    }

    /// The API key, or a configuration error for paths that need the oracle.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.anthropic_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(PortalWatchError::Config(
                "ANTHROPIC_API_KEY environment variable is required for verification".to_string(),
            )
            .into()),
        }
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let head: String = v.chars().take(5).collect();
                    format!("{}...({} chars)", head, v.chars().count())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::debug!("Config loaded:");
        tracing::debug!("  ANTHROPIC_API_KEY: {}", preview_opt(&self.anthropic_api_key));
        tracing::debug!("  PORTALWATCH_MODEL: {}", preview_opt(&self.model));
    }
}
