// Error handling module
// Defines the error types surfaced by the adapter and its collaborators

use thiserror::Error;

/// Errors that can occur while configuring or executing an authentication attempt
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Missing or malformed adapter configuration (URL, method, options)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// URL template could not be resolved into a concrete URL
    #[error("URL resolution failed: {0}")]
    ResolverError(String),

    /// Remote endpoint answered with a non-success status
    #[error("HTTP error: {status} - {message}")]
    HttpStatus { status: u16, message: String },

    /// Network or protocol failure before a response was received
    #[error("HTTP request failed: {message} (kind: {kind})")]
    Transport { kind: String, message: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AdapterError {
    /// Short machine-readable category, used in logs and serialized results
    pub fn kind(&self) -> &str {
        match self {
            AdapterError::ConfigError(_) => "config_error",
            AdapterError::ResolverError(_) => "resolver_error",
            AdapterError::HttpStatus { .. } => "http_status",
            AdapterError::Transport { kind, .. } => kind,
            AdapterError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status code, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AdapterError::ConfigError("No URL configured".to_string());
        assert_eq!(err.to_string(), "Configuration error: No URL configured");

        let err = AdapterError::ResolverError("missing parameter 'tenant'".to_string());
        assert_eq!(
            err.to_string(),
            "URL resolution failed: missing parameter 'tenant'"
        );

        let err = AdapterError::HttpStatus {
            status: 401,
            message: "Bad credentials".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: 401 - Bad credentials");
    }

    #[test]
    fn test_transport_error_message() {
        let err = AdapterError::Transport {
            kind: "timeout".to_string(),
            message: "operation timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP request failed: operation timed out (kind: timeout)"
        );
    }

    #[test]
    fn test_internal_error_message() {
        let err = AdapterError::Internal(anyhow::anyhow!("Something went wrong"));
        assert_eq!(err.to_string(), "Internal error: Something went wrong");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(AdapterError::ConfigError(String::new()).kind(), "config_error");
        assert_eq!(
            AdapterError::ResolverError(String::new()).kind(),
            "resolver_error"
        );
        assert_eq!(
            AdapterError::HttpStatus {
                status: 500,
                message: String::new()
            }
            .kind(),
            "http_status"
        );
        assert_eq!(
            AdapterError::Transport {
                kind: "connection_failed".to_string(),
                message: String::new()
            }
            .kind(),
            "connection_failed"
        );
    }

    #[test]
    fn test_error_status() {
        let err = AdapterError::HttpStatus {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.status(), Some(403));

        let err = AdapterError::ConfigError("bad".to_string());
        assert_eq!(err.status(), None);
    }
}
