//! Error types for schema validation and option merging.
//!
//! Every fatal condition is a [`MergeError`] variant. The `Display` impl
//! names the offending key or parameter, what was expected and what was
//! observed.

use thiserror::Error;

/// Errors that abort a merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A descriptor in the schema is malformed.
    #[error("expected option `{key}` {expected}, got {found}")]
    SchemaMalformed {
        /// Offending schema key.
        key: String,
        /// What a well-formed descriptor provides.
        expected: String,
        /// What was found instead.
        found: String,
    },

    /// An invocation parameter has the wrong shape.
    #[error("expected {parameter} to be {expected}, got {observed_type} {observed}")]
    InvocationMalformed {
        /// Parameter name (`user_options`, `target`, `prefix`, ...).
        parameter: String,
        /// Expected shape.
        expected: String,
        /// Reported type of the observed value.
        observed_type: String,
        /// Rendered observed value.
        observed: String,
    },

    /// A required key is absent from the user options.
    #[error("{prefix}missing required option {key}, expected {description}.{suffix}")]
    MissingRequired {
        /// Missing key.
        key: String,
        /// Descriptor description.
        description: String,
        /// Caller-supplied message prefix.
        prefix: String,
        /// Caller-supplied message suffix.
        suffix: String,
    },

    /// A supplied value was rejected by its validator.
    #[error("{prefix}{key} expected {description}, got {observed_type} {observed}.{suffix}")]
    ValidationFailed {
        /// Rejected key.
        key: String,
        /// Descriptor description.
        description: String,
        /// Reported type of the rejected value.
        observed_type: String,
        /// Rendered rejected value.
        observed: String,
        /// Caller-supplied message prefix.
        prefix: String,
        /// Caller-supplied message suffix.
        suffix: String,
    },

    /// A validator or required-predicate panicked during the merge.
    #[error("validator for option {key} panicked: {message}")]
    ValidatorPanicked {
        /// Key whose validator panicked.
        key: String,
        /// Panic message.
        message: String,
    },
}

impl MergeError {
    /// Key or parameter name the error is about.
    pub fn subject(&self) -> &str {
        match self {
            MergeError::SchemaMalformed { key, .. }
            | MergeError::MissingRequired { key, .. }
            | MergeError::ValidationFailed { key, .. }
            | MergeError::ValidatorPanicked { key, .. } => key,
            MergeError::InvocationMalformed { parameter, .. } => parameter,
        }
    }
}

/// Convenience alias for results with [`MergeError`].
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors that can occur while loading [`MergeSettings`](crate::MergeSettings)
/// from a file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Parsed document has fields of the wrong type.
    #[error("invalid settings: {0}")]
    Invalid(#[from] MergeError),
}
