//! Error types shared across Mimic crates.

use std::path::PathBuf;

/// Top-level error type for Mimic operations.
#[derive(Debug, thiserror::Error)]
pub enum MimicError {
    /// A durations report (or other line-oriented input) could not be parsed.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A caller passed a value that violates an engine contract.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MimicError.
pub type MimicResult<T> = Result<T, MimicError>;

impl MimicError {
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: msg.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_names_line() {
        let err = MimicError::parse(3, "expected 3 fields, found 2");
        assert_eq!(
            err.to_string(),
            "Parse error at line 3: expected 3 fields, found 2"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let raw = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: MimicError = raw.into();
        assert!(matches!(err, MimicError::Json(_)));
    }
}
