//! Error types for trainlog
//!
//! Every failure surfaces to the caller: a log that fails to parse is never
//! returned half-populated, and aggregation never substitutes defaults for
//! missing series.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trainlog error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed log file (wrong token arity, non-numeric token)
    #[error("Log parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number in the log file
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A selected dataset does not carry the requested metric
    #[error("Missing metric '{metric}' in dataset '{dataset}' of log '{log}'")]
    MissingMetric {
        /// Name of the log inside the collection
        log: String,
        /// Dataset that was selected
        dataset: String,
        /// Metric that was requested
        metric: String,
    },

    /// A series has no values, so it has no maximum
    #[error("Empty series for metric '{metric}' in dataset '{dataset}' of log '{log}'")]
    EmptySeries {
        /// Name of the log inside the collection
        log: String,
        /// Dataset that was selected
        dataset: String,
        /// Metric that was requested
        metric: String,
    },

    /// Invalid argument or inconsistent input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Chart backend failure
    #[error("Render error: {0}")]
    Render(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }
}
