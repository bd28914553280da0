//! Schema and invocation validation.
//!
//! Schemas are checked once, eagerly, before any merge work: the first
//! malformed descriptor aborts with [`MergeError::SchemaMalformed`].
//! Untyped invocation inputs (user options, target maps, settings fields)
//! are checked with the `expect_*` helpers, which fail with
//! [`MergeError::InvocationMalformed`].
//!
//! # Examples
//!
//! ```
//! use option_merge_core::*;
//! use serde_json::json;
//!
//! let schema = OptionSchema::new().with_option(
//!     "verbose",
//!     OptionDescriptor::optional(json!(false), "a boolean", validators::boolean()),
//! );
//! assert!(validate_schema(&schema).is_ok());
//!
//! // Invalid: an optional key without a default
//! let mut descriptor = OptionDescriptor::optional(json!(false), "a boolean", validators::boolean());
//! descriptor.default = None;
//! let bad = OptionSchema::new().with_option("verbose", descriptor);
//! assert!(matches!(validate_schema(&bad), Err(MergeError::SchemaMalformed { .. })));
//! ```

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::{OptionDescriptor, OptionMap, OptionSchema, render_value, value_kind};

/// Knobs for [`validate_schema_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Invoke every validator against [`probe_values`] and reject validators
    /// that panic.
    pub smoke_test_validators: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            smoke_test_validators: true,
        }
    }
}

/// Representative values used to smoke-test validators.
///
/// JSON cannot carry `NaN` or infinities, so `f64::MAX` and `f64::MIN`
/// stand in for the extremes.
pub fn probe_values() -> Vec<Value> {
    vec![
        json!(true),
        json!(false),
        json!(0),
        json!(1),
        json!(std::f64::consts::PI),
        json!(f64::MAX),
        json!(f64::MIN),
        Value::Null,
        json!(""),
        json!("abc"),
        json!("ÿ¥€ßπ"),
        json!([1, 2, 3]),
        json!({ "a": 1 }),
    ]
}

/// Validates a schema with the default [`ValidateOptions`].
///
/// # Errors
///
/// Returns [`MergeError::SchemaMalformed`] for the first malformed
/// descriptor.
///
/// # Panics
///
/// Never panics itself. A validator that panics on a probe value is
/// reported as [`MergeError::SchemaMalformed`], but the process panic hook
/// still runs, so the default hook prints the panic to stderr.
pub fn validate_schema(schema: &OptionSchema) -> Result<()> {
    validate_schema_with(schema, ValidateOptions::default())
}

/// Validates a schema.
///
/// Checks, per key and in schema order: the key is non-empty, the
/// description is non-empty, default and requirement agree, and (when
/// enabled) the validator survives every probe value.
///
/// # Examples
///
/// ```
/// use option_merge_core::*;
/// use serde_json::json;
///
/// let fragile = Validator::from_fn(|v| v.as_str().unwrap().is_empty());
/// let schema = OptionSchema::new()
///     .with_option("name", OptionDescriptor::optional(json!(""), "a string", fragile));
///
/// let relaxed = ValidateOptions { smoke_test_validators: false };
/// assert!(validate_schema_with(&schema, relaxed).is_ok());
/// assert!(validate_schema(&schema).is_err());
/// ```
pub fn validate_schema_with(schema: &OptionSchema, options: ValidateOptions) -> Result<()> {
    for (key, descriptor) in schema.iter() {
        validate_descriptor(key, descriptor, options)?;
    }
    debug!(keys = schema.len(), "option schema is well-formed");
    Ok(())
}

fn validate_descriptor(
    key: &str,
    descriptor: &OptionDescriptor,
    options: ValidateOptions,
) -> Result<()> {
    if key.trim().is_empty() {
        return Err(malformed(key, "to have a non-empty name", format!("{key:?}")));
    }

    if descriptor.description.trim().is_empty() {
        return Err(malformed(
            key,
            "to have a non-empty description",
            format!("{:?}", descriptor.description),
        ));
    }

    match (descriptor.required.needs_default(), &descriptor.default) {
        (true, None) => {
            return Err(malformed(
                key,
                "to have a default value unless it is always required",
                "no default".to_string(),
            ));
        }
        (false, Some(default)) => {
            return Err(malformed(
                key,
                "to have no default value when it is always required",
                format!("default {} {}", value_kind(default), render_value(default)),
            ));
        }
        _ => {}
    }

    if options.smoke_test_validators {
        let context = OptionMap::new();
        for probe in probe_values() {
            if let Err(message) = descriptor.validator.guarded(&probe, &context) {
                return Err(malformed(
                    key,
                    "to have a validator that returns a boolean for any value",
                    format!(
                        "a panic on {} {}: {message}",
                        value_kind(&probe),
                        render_value(&probe)
                    ),
                ));
            }
        }
    }

    Ok(())
}

fn malformed(key: &str, expected: &str, found: String) -> MergeError {
    MergeError::SchemaMalformed {
        key: key.to_string(),
        expected: expected.to_string(),
        found,
    }
}

fn invocation_malformed(parameter: &str, expected: &str, value: &Value) -> MergeError {
    MergeError::InvocationMalformed {
        parameter: parameter.to_string(),
        expected: expected.to_string(),
        observed_type: value_kind(value).to_string(),
        observed: render_value(value),
    }
}

const OBJECT_SHAPE: &str = "a non-null, non-array object";

/// Checks that `value` is a JSON object.
///
/// # Errors
///
/// Returns [`MergeError::InvocationMalformed`] naming `parameter`.
pub fn expect_object<'a>(parameter: &str, value: &'a Value) -> Result<&'a OptionMap> {
    value
        .as_object()
        .ok_or_else(|| invocation_malformed(parameter, OBJECT_SHAPE, value))
}

/// Mutable counterpart of [`expect_object`].
///
/// # Errors
///
/// Returns [`MergeError::InvocationMalformed`] naming `parameter`.
pub fn expect_object_mut<'a>(parameter: &str, value: &'a mut Value) -> Result<&'a mut OptionMap> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(invocation_malformed(parameter, OBJECT_SHAPE, other)),
    }
}

/// Checks that an optional field is a string. Absent and `null` yield `None`.
///
/// # Errors
///
/// Returns [`MergeError::InvocationMalformed`] naming `parameter`.
pub fn expect_optional_string<'a>(
    parameter: &str,
    value: Option<&'a Value>,
) -> Result<Option<&'a str>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(invocation_malformed(parameter, "an optional string", other)),
    }
}

/// Checks that an optional field is a boolean. Absent and `null` yield `None`.
///
/// # Errors
///
/// Returns [`MergeError::InvocationMalformed`] naming `parameter`.
pub fn expect_optional_bool(parameter: &str, value: Option<&Value>) -> Result<Option<bool>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(invocation_malformed(parameter, "an optional boolean", other)),
    }
}
