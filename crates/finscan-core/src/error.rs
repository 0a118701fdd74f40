//! Error types for the finscan-core library.

use thiserror::Error;

/// Main error type for the finscan library.
///
/// Missing evidence (no keyword hit, no label, no opening balance) is never an
/// error; it shows up as absent fields or a skipped validation instead.
#[derive(Error, Debug)]
pub enum FinscanError {
    /// A category name outside the closed set.
    #[error("unknown document category: {0}")]
    UnknownCategory(String),

    /// A label pattern in the configuration does not compile.
    #[error("invalid label pattern for field {field}: {source}")]
    LabelPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// A keyword in the configuration does not compile.
    #[error("invalid keyword {keyword:?}: {source}")]
    Keyword {
        keyword: String,
        #[source]
        source: regex::Error,
    },

    /// OCR input or configuration JSON is malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for the finscan library.
pub type Result<T> = std::result::Result<T, FinscanError>;
