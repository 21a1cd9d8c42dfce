//! Application level errors.

use promscatter_client::ClientError;
use thiserror::Error;

use crate::plot::PlotError;

/// Errors raised while resolving settings from flags, file and environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No query words were given.
    #[error("No query given")]
    NoQuery,

    /// No backend address in flags, config file or environment.
    #[error("No backend address given (use --addr or PROMSCATTER_ADDR)")]
    MissingAddress,

    /// A duration setting could not be parsed.
    #[error("Invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    /// The query window is empty or reversed.
    #[error("Invalid range: --from ({from}) must be further back than --to ({to})")]
    InvalidRange { from: String, to: String },

    /// The config file or environment could not be read.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum AppError {
    /// The backend request failed.
    #[error("Query failed: {0}")]
    Backend(ClientError),

    /// The backend returned a result shape that has no handling.
    #[error("Unsupported result type {0:?}")]
    UnsupportedResult(String),

    /// The plot could not be rendered.
    #[error(transparent)]
    Render(#[from] PlotError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::UnsupportedResult(name) => AppError::UnsupportedResult(name),
            other => AppError::Backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promscatter_client::TransportError;

    #[test]
    fn test_unsupported_result_lifted() {
        let err = AppError::from(ClientError::UnsupportedResult("histogram".to_string()));
        assert!(matches!(err, AppError::UnsupportedResult(ref name) if name == "histogram"));
    }

    #[test]
    fn test_backend_error_wrapped() {
        let err = AppError::from(ClientError::Transport(TransportError::Cancelled));
        assert!(matches!(err, AppError::Backend(ref e) if e.is_cancelled()));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(ConfigError::NoQuery.to_string(), "No query given");
        let err = ConfigError::InvalidDuration {
            field: "from",
            value: "2x".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid duration for from: \"2x\"");
    }
}
