use std::path::PathBuf;

/// Specifies an error produced off the hot path: while loading, persisting or configuring.
///
/// Hot path operations (weight reads and updates, learning and cost adjustment) never return
/// this error to the caller: they log it and fall back to a safe value instead.
#[derive(thiserror::Error, Debug)]
pub enum PreferenceError {
    /// Input data is malformed: negative times, broken rows, etc.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Configuration values are out of their valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A numeric computation produced a non-finite or otherwise unusable value.
    #[error("computation failure: {0}")]
    Computation(String),
    /// Reading or writing a file failed.
    #[error("i/o failure on {path:?}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Reading or writing a delimited file failed.
    #[error("csv failure on {path:?}: {source}")]
    Csv {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },
    /// Configuration cannot be deserialized.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// A result type used by fallible operations of the crate.
pub type PreferenceResult<T> = Result<T, PreferenceError>;
