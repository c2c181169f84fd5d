use std::path::PathBuf;

use pinchpoint_core::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("{path}:{line}: {message}")]
    Trace {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cannot read {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Trace { .. } => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn trace(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Trace {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessError;

    #[test]
    fn trace_error_reports_location() {
        let error = HarnessError::trace("run.jsonl", 7, "missing field `kind`");
        assert_eq!(error.to_string(), "run.jsonl:7: missing field `kind`");
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn config_errors_exit_with_two() {
        let error = HarnessError::Config {
            path: "bad.toml".into(),
            source: pinchpoint_core::ConfigError::Invalid(vec!["stabilizer.window must be > 0".into()]),
        };
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().starts_with("bad.toml: invalid configuration"));
    }

    #[test]
    fn io_errors_exit_with_one() {
        let error = HarnessError::from(std::io::Error::other("boom"));
        assert_eq!(error.exit_code(), 1);
    }
}
