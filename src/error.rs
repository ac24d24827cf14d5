//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `attr-merge` library. It uses the `thiserror` library to create an `Error`
//! enum covering every failure the library can report, plus the
//! [`ConflictError`] data contract produced by the merge conflict checker.
//!
//! ## Key Components
//!
//! - **`ConflictError`**: The only error the checker itself produces. It carries
//!   the rendered attribute path of the first conflict and the names of the
//!   sources that supplied values at that path.
//!
//! - **`Error`**: The main enum for everything around the checker: manifest
//!   parsing and evaluation, attribute file loading, and conflicts surfaced
//!   through the same `Result` type.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use serde::Serialize;
use thiserror::Error;

use crate::path::AttributePath;

/// Two or more sources disagree on the value at one attribute path.
///
/// The checker stops at the first conflict it meets, so a single instance
/// describes exactly one path. `provided_by` always has at least two entries
/// and may repeat a source name if that source was added more than once.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Attribute conflict at {attribute_path}: provided by {}", provided_by.join(", "))]
pub struct ConflictError {
    /// The most specific path at which the disagreement manifests.
    pub attribute_path: AttributePath,
    /// Every source that supplied a value at `attribute_path`, in the order
    /// they were merged, ending with the source that triggered the conflict.
    pub provided_by: Vec<String>,
}

impl ConflictError {
    pub fn new(attribute_path: AttributePath, provided_by: Vec<String>) -> Self {
        Self {
            attribute_path,
            provided_by,
        }
    }
}

/// Main error type for attr-merge operations
#[derive(Error, Debug)]
pub enum Error {
    /// Evaluating the manifest produced one or more errors.
    #[error("Manifest evaluation failed with {count} error(s):\n{summary}")]
    Evaluation { count: usize, summary: String },

    /// An attribute file could not be read or parsed.
    #[error("Attribute file error: {path}: {message}")]
    AttributeFile { path: String, message: String },

    /// The file extension does not map to a supported attribute format.
    #[error("Unsupported attribute file format: {path} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat { path: String },

    /// Parsed attributes were structurally unusable (e.g. not a mapping).
    #[error("Invalid attributes: {message}")]
    InvalidAttributes { message: String },

    /// A rendered attribute path could not be parsed back into keys.
    #[error("Attribute path error: {message}")]
    Path { message: String },

    /// Two sources disagree on an attribute value.
    #[error("{0}")]
    Conflict(#[from] ConflictError),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
