//! Error handling for the sitegen application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error as ThisError;

/// Custom error types for sitegen operations.
///
/// Every variant aborts the whole run; there is no partial-success mode.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents errors that occur during template rendering
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    #[error("Directory walk error: {0}.")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Feed error: {0}.")]
    FeedError(String),

    /// The document does not open with a front-matter block or the block is not closed.
    #[error("Malformed document '{path}': {reason}.")]
    MalformedDocument { path: String, reason: String },

    /// The merged configuration violates one of its invariants.
    #[error("Configuration error: {0}.")]
    ConfigValidationError(String),

    /// The converter exited with a non-zero status.
    #[error("Converter failed on '{page}' with {status}:\n{stderr}")]
    ConverterInvocationError { page: String, status: String, stderr: String },

    #[error("Converter did not finish '{page}' within {seconds}s.")]
    ConverterTimeoutError { page: String, seconds: u64 },

    #[error("Source file '{path}' does not exist.")]
    MissingSourceFile { path: String },

    /// The extras file is neither YAML nor JSON.
    #[error("Unsupported globals file format: '{path}' (expected .yml, .yaml or .json).")]
    UnsupportedGlobalsFileFormat { path: String },
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
