//! Error taxonomy shared by the library and the `vectara` binary.
//!
//! Library functions return [`Result`] with a typed [`Error`]. Command
//! handlers wrap these in `anyhow` with extra context; the dispatcher walks
//! the chain back to the typed error to pick an exit code.

use std::process::ExitCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unreadable credentials / configuration file.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Bad CLI arguments, malformed JSON options, unknown model name or type.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The corpus service rejected a request or could not be reached.
    #[error("Service error{}: {message}", status_suffix(.status))]
    Service {
        status: Option<u16>,
        message: String,
    },
    /// The NER backend failed to produce entities.
    #[error("Model error: {0}")]
    Model(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl Error {
    pub fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Service {
            status,
            message: message.into(),
        }
    }

    /// True for 401/403 responses from the corpus service.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Service {
                status: Some(401) | Some(403),
                ..
            }
        )
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::Configuration(_) => ExitCode::from(2),
            e if e.is_auth_failure() => ExitCode::from(3),
            _ => ExitCode::FAILURE,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Validation(format!("invalid JSON: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for an error returned by a command handler.
///
/// Untyped errors (plain `anyhow` messages) map to the generic failure code.
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(ExitCode::FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_service_error_display_includes_status() {
        let err = Error::service(Some(404), "corpus not found");
        assert_eq!(err.to_string(), "Service error (404): corpus not found");

        let err = Error::service(None, "connection refused");
        assert_eq!(err.to_string(), "Service error: connection refused");
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(Error::service(Some(401), "bad key").is_auth_failure());
        assert!(Error::service(Some(403), "forbidden").is_auth_failure());
        assert!(!Error::service(Some(500), "boom").is_auth_failure());
        assert!(!Error::Validation("x".into()).is_auth_failure());
    }

    #[test]
    fn test_exit_code_found_through_context() {
        let result: anyhow::Result<()> = Err(Error::Configuration("no keys".into()))
            .context("while creating corpus");
        let err = result.unwrap_err();
        assert_eq!(exit_code_for(&err), ExitCode::from(2));

        let plain = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&plain), ExitCode::FAILURE);
    }
}
