//! Error types for askctx.
//!
//! Library crates use [`AskCtxError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// Which step of remote acquisition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStage {
    /// Creating the ephemeral workspace directory.
    Workspace,
    /// Cloning the remote repository into the workspace.
    Clone,
}

impl fmt::Display for AcquisitionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workspace => f.write_str("workspace creation"),
            Self::Clone => f.write_str("clone"),
        }
    }
}

/// Top-level error type for all askctx operations.
#[derive(Debug, thiserror::Error)]
pub enum AskCtxError {
    /// No credential was given explicitly and the fallback variable is empty.
    #[error("API key not set: pass --key or set the {var} environment variable")]
    MissingCredential { var: String },

    /// Remote source could not be provisioned.
    #[error("failed to acquire {url} ({stage}): {cause}")]
    AcquisitionFailed {
        url: String,
        stage: AcquisitionStage,
        cause: String,
    },

    /// Local source path could not be opened.
    #[error("cannot read local source {path:?}: {source}")]
    LocalReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Walking or reading the source tree failed.
    #[error("aggregation failed at {path:?}: {cause}")]
    AggregationFailed { path: PathBuf, cause: String },

    /// The corpus grew past the configured bound.
    #[error("corpus exceeds {limit} bytes (reached {size}); narrow --ext or raise the limit")]
    CorpusTooLarge { limit: u64, size: u64 },

    /// Transport failure or non-2xx response from the backend.
    #[error("backend error{}: {cause}", status_suffix(.status))]
    BackendError { status: Option<u16>, cause: String },

    /// The backend answered successfully but with nothing usable.
    #[error("empty backend response: {what}")]
    EmptyResponse { what: String },

    /// The run was cancelled or hit its deadline.
    #[error("cancelled during {stage}")]
    Cancelled { stage: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AskCtxError>;

impl AskCtxError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a backend error with an optional HTTP status.
    pub fn backend(status: Option<u16>, cause: impl Into<String>) -> Self {
        Self::BackendError {
            status,
            cause: cause.into(),
        }
    }

    /// Create an empty-response error.
    pub fn empty(what: impl Into<String>) -> Self {
        Self::EmptyResponse { what: what.into() }
    }

    /// Create a cancellation error for the named stage.
    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AskCtxError::config("bad mode");
        assert_eq!(err.to_string(), "config error: bad mode");

        let err = AskCtxError::MissingCredential {
            var: "API_KEY".into(),
        };
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn backend_error_includes_status_when_known() {
        let err = AskCtxError::backend(Some(503), "overloaded");
        assert_eq!(err.to_string(), "backend error (HTTP 503): overloaded");

        let err = AskCtxError::backend(None, "connection refused");
        assert_eq!(err.to_string(), "backend error: connection refused");
    }

    #[test]
    fn acquisition_stages_are_distinguishable() {
        let err = AskCtxError::AcquisitionFailed {
            url: "https://example.com/repo.git".into(),
            stage: AcquisitionStage::Clone,
            cause: "repository not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("(clone)"));
        assert!(msg.contains("repository not found"));
    }
}
