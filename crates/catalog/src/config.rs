//! Configuration from environment variables.
//!
//! | Variable             | Required | Purpose                                      |
//! |----------------------|----------|----------------------------------------------|
//! | `BAYBERRY_API_URL`   | yes      | Base URL of the catalog REST API             |
//! | `BAYBERRY_EVENTS_URL`| no       | Base URL of the event streams (default: API) |
//! | `BAYBERRY_API_TOKEN` | no       | Bearer token sent with every request         |
//! | `BAYBERRY_STATE_DIR` | no       | Directory for persisted state (`.bayberry`)  |

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default directory for persisted state, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".bayberry";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("environment variable {0} is not set")]
    MissingEnvVar(&'static str),

    /// An environment variable is set but has an invalid value
    #[error("environment variable {name} is invalid: {reason}")]
    InvalidEnvVar {
        /// Variable name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Connection settings for the remote catalog.
#[derive(Clone)]
pub struct SourceConfig {
    /// Base URL of the catalog REST API.
    pub api_url: Url,
    /// Base URL of the SSE endpoints. Defaults to [`Self::api_url`].
    pub events_url: Url,
    /// Optional bearer token.
    pub api_token: Option<SecretString>,
}

// Manual Debug so the token never lands in logs.
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("api_url", &self.api_url.as_str())
            .field("events_url", &self.events_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Top-level configuration for the catalog engine.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Remote source settings.
    pub source: SourceConfig,
    /// Directory holding persisted navigational state.
    pub state_dir: PathBuf,
}

impl CatalogConfig {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_url = parse_url("BAYBERRY_API_URL", &get_required_env("BAYBERRY_API_URL")?)?;
        let events_url = match get_optional_env("BAYBERRY_EVENTS_URL") {
            Some(raw) => parse_url("BAYBERRY_EVENTS_URL", &raw)?,
            None => api_url.clone(),
        };
        let api_token = get_optional_env("BAYBERRY_API_TOKEN").map(SecretString::from);

        Ok(Self {
            source: SourceConfig {
                api_url,
                events_url,
                api_token,
            },
            state_dir: Self::state_dir_from_env(),
        })
    }

    /// Resolve the state directory alone, without requiring API settings.
    ///
    /// State inspection commands work offline, so they must not fail on a
    /// missing `BAYBERRY_API_URL`.
    #[must_use]
    pub fn state_dir_from_env() -> PathBuf {
        let _ = dotenvy::dotenv();
        PathBuf::from(get_env_or_default("BAYBERRY_STATE_DIR", DEFAULT_STATE_DIR))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn get_required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name))
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_string())
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_accepts_http_base() {
        let url = parse_url("BAYBERRY_API_URL", "https://api.bayberry.test/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.bayberry.test/v1");
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        let err = parse_url("BAYBERRY_API_URL", "not a url").unwrap_err();
        assert!(err.to_string().contains("BAYBERRY_API_URL"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = SourceConfig {
            api_url: Url::parse("https://api.bayberry.test").unwrap(),
            events_url: Url::parse("https://events.bayberry.test").unwrap(),
            api_token: Some(SecretString::from("super-secret-token")),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("super-secret-token"));
    }

    #[test]
    fn test_missing_env_var_display() {
        let err = ConfigError::MissingEnvVar("BAYBERRY_API_URL");
        assert_eq!(
            err.to_string(),
            "environment variable BAYBERRY_API_URL is not set"
        );
    }
}
