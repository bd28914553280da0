//! Declarative option schemas and validated option merging.
//!
//! This crate resolves a map of user-supplied option values against a
//! schema of recognized keys:
//!
//! - [`OptionSchema`] — ordered map of key → [`OptionDescriptor`].
//! - [`OptionDescriptor`] — description, [`Validator`], default and
//!   [`Requirement`] for one key.
//! - [`MergeSettings`] — message prefix/suffix and the strict flag.
//! - [`Diagnostic`] — a rejected value that was replaced by its default,
//!   delivered to a [`DiagnosticSink`].
//!
//! Validation ([`validate_schema`]) rejects malformed schemas before any
//! merge work. Merging ([`merge_options`], [`merge_options_into`]) resolves
//! every schema key to the validated user value or its default and ignores
//! keys the schema does not recognize.
//!
//! # Example
//!
//! ```
//! use option_merge_core::*;
//! use serde_json::json;
//!
//! let schema = OptionSchema::new()
//!     .with_option(
//!         "threshold",
//!         OptionDescriptor::optional(json!(0), "a number between 0 and 1", validators::number_in_range(0.0, 1.0)),
//!     )
//!     .with_option("apiKey", OptionDescriptor::required("a string", validators::string()));
//!
//! let user = json!({ "threshold": 0.5, "apiKey": "secret", "extra": 1 });
//! let resolved = merge_options(&schema, Some(&user), &MergeSettings::default(), &mut TracingSink).unwrap();
//!
//! assert_eq!(
//!     serde_json::Value::Object(resolved),
//!     json!({ "threshold": 0.5, "apiKey": "secret" })
//! );
//! ```

mod diagnostic;
mod error;
mod merge;
mod settings;
mod types;
mod validate;
pub mod validators;

pub use diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticSink, TracingSink};
pub use error::{MergeError, Result, SettingsError};
pub use merge::{merge_option_map, merge_options, merge_options_collect, merge_options_into};
pub use settings::MergeSettings;
pub use types::*;
pub use validate::{
    ValidateOptions, expect_object, expect_object_mut, expect_optional_bool,
    expect_optional_string, probe_values, validate_schema, validate_schema_with,
};
