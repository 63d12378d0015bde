//! Error types shared by the experiment driver and its components.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for phylab.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// An underlying I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An MCS index does not exist in the selected table.
    #[error("MCS index {index} out of range for table {table} ({len} entries)")]
    InvalidMcs { index: usize, table: u8, len: usize },

    /// Per-UT inputs disagree on the number of user terminals.
    #[error("shape mismatch: expected {expected} user terminals, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Tensor data could not be read back from the backend.
    #[error("tensor readback failed: {0}")]
    Tensor(String),

    /// Writing the `.npz` summary archive failed.
    #[error("failed to write summary archive: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),

    /// Rendering the chart failed.
    #[error("failed to render chart: {0}")]
    Plot(String),
}

/// A specialized `Result` type for phylab operations.
pub type Result<T> = std::result::Result<T, Error>;
