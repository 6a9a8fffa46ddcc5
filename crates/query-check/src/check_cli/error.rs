//! Error types for the query check CLI.

use camino::Utf8PathBuf;
use query_schema::ValidationError;
use thiserror::Error;

/// Errors surfaced while checking a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// The input file could not be opened or read.
    #[error("failed to read {path}: {message}")]
    Read {
        /// Path supplied on the command line.
        path: Utf8PathBuf,
        /// Underlying I/O error message.
        message: String,
    },
    /// The input file is not valid JSON.
    #[error("{path} is not valid JSON: {message}")]
    InvalidJson {
        /// Path supplied on the command line.
        path: Utf8PathBuf,
        /// Parser error message.
        message: String,
    },
    /// Limit configuration could not be loaded.
    #[error("invalid configuration: {message}")]
    Config {
        /// Loader error message.
        message: String,
    },
    /// The document was rejected.
    #[error("validation failed at {}", .source)]
    Validation {
        /// The validation failure.
        #[from]
        #[source]
        source: ValidationError,
    },
    /// The validated structure could not be rendered.
    #[error("failed to render output: {message}")]
    Render {
        /// Serialiser error message.
        message: String,
    },
}

impl CliError {
    /// Returns the validation failure, if the document was rejected.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source } => Some(source),
            _ => None,
        }
    }
}
