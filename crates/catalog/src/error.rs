//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::source::SourceError;

/// Errors surfaced by the catalog engine.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A remote source operation failed
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_source() {
        let err = CatalogError::Source(SourceError::NotFound("p-404".to_string()));
        assert_eq!(err.to_string(), "source error: not found: p-404");
    }

    #[test]
    fn test_error_display_includes_config() {
        let err = CatalogError::Config(ConfigError::MissingEnvVar("BAYBERRY_API_URL"));
        assert!(err.to_string().contains("BAYBERRY_API_URL"));
    }
}
