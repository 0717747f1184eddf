//! Error types and exit codes for mcp-judge
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage or configuration error (bad flags, incompatible voting method)
//! - 3: Data error (unreadable fixtures or profiles, every judge failed)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Exit codes for the mcp-judge binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage or configuration error (2)
    Usage = 2,
    /// Data error - fixtures, profiles, jury outcome (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Why a text-generation call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Connection, DNS or transport failure
    Network,
    /// Rejected credentials (401/403)
    Auth,
    /// Provider throttling (429)
    RateLimit,
    /// Any other non-success status
    Server,
    /// Success status without usable message content
    Malformed,
    /// The task running the call panicked or was aborted
    Internal,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendErrorKind::Network => "network",
            BackendErrorKind::Auth => "auth",
            BackendErrorKind::RateLimit => "rate_limit",
            BackendErrorKind::Server => "server",
            BackendErrorKind::Malformed => "malformed",
            BackendErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while judging
#[derive(Error, Debug)]
pub enum JudgeError {
    // Per-judge failures: recorded and excluded by a jury
    #[error("backend error ({kind}): {message}")]
    Backend {
        kind: BackendErrorKind,
        message: String,
    },

    #[error("invalid judge response: {0}")]
    Validation(String),

    #[error("judge timed out after {0:?}")]
    Timeout(Duration),

    // Setup mistakes (exit code 2)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    UsageError(String),

    // Data errors (exit code 3)
    #[error("all {failures} judges failed")]
    AllJudgesFailed { failures: usize },

    #[error("jury reached no verdict: {0}")]
    NoVerdict(String),

    #[error("file not found: {path:?}")]
    FileNotFound { path: PathBuf },

    #[error("invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("evaluation cancelled")]
    Cancelled,

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl JudgeError {
    pub fn backend(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        JudgeError::Backend {
            kind,
            message: message.into(),
        }
    }

    /// True for failures a jury records against one judge instead of
    /// aborting the whole vote.
    pub fn is_judge_failure(&self) -> bool {
        matches!(
            self,
            JudgeError::Backend { .. } | JudgeError::Validation(_) | JudgeError::Timeout(_)
        )
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            JudgeError::Configuration(_)
            | JudgeError::InvalidInput(_)
            | JudgeError::UsageError(_) => ExitCode::Usage,

            JudgeError::AllJudgesFailed { .. }
            | JudgeError::NoVerdict(_)
            | JudgeError::FileNotFound { .. }
            | JudgeError::InvalidFixture(_)
            | JudgeError::Yaml(_)
            | JudgeError::Toml(_) => ExitCode::Data,

            JudgeError::Backend { .. }
            | JudgeError::Validation(_)
            | JudgeError::Timeout(_)
            | JudgeError::Cancelled
            | JudgeError::Io(_)
            | JudgeError::Json(_)
            | JudgeError::Other(_) => ExitCode::Failure,
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            JudgeError::Backend { .. } => "backend_error",
            JudgeError::Validation(_) => "validation_error",
            JudgeError::Timeout(_) => "timeout",
            JudgeError::Configuration(_) => "configuration_error",
            JudgeError::InvalidInput(_) => "invalid_input",
            JudgeError::UsageError(_) => "usage_error",
            JudgeError::AllJudgesFailed { .. } => "all_judges_failed",
            JudgeError::NoVerdict(_) => "no_verdict",
            JudgeError::FileNotFound { .. } => "file_not_found",
            JudgeError::InvalidFixture(_) => "invalid_fixture",
            JudgeError::Cancelled => "cancelled",
            JudgeError::Io(_) => "io_error",
            JudgeError::Yaml(_) => "yaml_error",
            JudgeError::Json(_) => "json_error",
            JudgeError::Toml(_) => "toml_error",
            JudgeError::Other(_) => "other",
        }
    }
}

/// Result type alias for mcp-judge operations
pub type Result<T> = std::result::Result<T, JudgeError>;
