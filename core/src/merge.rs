//! Option merging with validation and default fallback.
//!
//! [`merge_options`] walks the schema in order and resolves every key to
//! either the validated user value or the descriptor's default. Keys the
//! schema does not recognize are ignored. Required keys that are missing or
//! rejected abort the merge in any mode. Other rejected values abort in
//! strict mode and fall back to the default (with a [`Diagnostic`]) in
//! lenient mode.
//!
//! [`merge_options_into`] runs the same resolution and then writes the
//! resolved entries into a caller-owned map, leaving its other keys alone.
//!
//! # Example
//!
//! ```
//! use option_merge_core::*;
//! use serde_json::json;
//!
//! let schema = OptionSchema::new().with_option(
//!     "threshold",
//!     OptionDescriptor::optional(json!(0), "a number between 0 and 1", validators::number_in_range(0.0, 1.0)),
//! );
//!
//! let user = json!({ "threshold": 3, "unknown": true });
//! let (resolved, diagnostics) =
//!     merge_options_collect(&schema, Some(&user), &MergeSettings::lenient()).unwrap();
//!
//! assert_eq!(serde_json::Value::Object(resolved), json!({ "threshold": 0 }));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].key, "threshold");
//! ```

use serde_json::Value;
use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticSink};
use crate::error::{MergeError, Result};
use crate::settings::MergeSettings;
use crate::validate::{expect_object, expect_object_mut, validate_schema};
use crate::{OptionDescriptor, OptionMap, OptionSchema, Requirement, render_value, value_kind};

/// Merges user options against a schema into a fresh map.
///
/// `user_options` must be a JSON object; `None` is treated as an empty
/// object. The schema is validated first, then the user options, then
/// each key is resolved in schema order.
///
/// # Errors
///
/// - [`MergeError::SchemaMalformed`] if the schema is malformed.
/// - [`MergeError::InvocationMalformed`] if `user_options` is not an object.
/// - [`MergeError::MissingRequired`] if a required key is absent.
/// - [`MergeError::ValidationFailed`] if a value is rejected in strict mode,
///   or a value is rejected while its key is required.
/// - [`MergeError::ValidatorPanicked`] if a validator or required-predicate
///   panics. The process panic hook still runs before the panic is caught.
///
/// # Examples
///
/// ```
/// use option_merge_core::*;
/// use serde_json::json;
///
/// let schema = OptionSchema::new()
///     .with_option("threshold", OptionDescriptor::optional(
///         json!(0),
///         "a number between 0 and 1",
///         validators::number_in_range(0.0, 1.0),
///     ));
///
/// let resolved = merge_options(
///     &schema,
///     Some(&json!({ "threshold": 0.5 })),
///     &MergeSettings::default(),
///     &mut TracingSink,
/// )
/// .unwrap();
/// assert_eq!(resolved["threshold"], json!(0.5));
///
/// let err = merge_options(
///     &schema,
///     Some(&json!({ "threshold": 3 })),
///     &MergeSettings::strict(),
///     &mut TracingSink,
/// )
/// .unwrap_err();
/// assert!(matches!(err, MergeError::ValidationFailed { .. }));
/// ```
pub fn merge_options(
    schema: &OptionSchema,
    user_options: Option<&Value>,
    settings: &MergeSettings,
    sink: &mut dyn DiagnosticSink,
) -> Result<OptionMap> {
    validate_schema(schema)?;
    let empty = OptionMap::new();
    let user = match user_options {
        Some(value) => expect_object("user_options", value)?,
        None => &empty,
    };
    resolve(schema, user, settings, sink)
}

/// Merges an already-typed user option map against a schema.
///
/// Same as [`merge_options`] without the shape check on the user options.
///
/// # Errors
///
/// Same as [`merge_options`], except
/// [`MergeError::InvocationMalformed`].
pub fn merge_option_map(
    schema: &OptionSchema,
    user_options: &OptionMap,
    settings: &MergeSettings,
    sink: &mut dyn DiagnosticSink,
) -> Result<OptionMap> {
    validate_schema(schema)?;
    resolve(schema, user_options, settings, sink)
}

/// Merges user options and writes the resolved entries into `target`.
///
/// Entries for schema keys overwrite existing values; every other key in
/// `target` is left untouched. Nothing is written unless the whole merge
/// succeeds.
///
/// # Errors
///
/// Same as [`merge_options`], plus
/// [`MergeError::InvocationMalformed`] if `target` is not an object.
///
/// # Examples
///
/// ```
/// use option_merge_core::*;
/// use serde_json::json;
///
/// let schema = OptionSchema::new()
///     .with_option("verbose", OptionDescriptor::optional(json!(false), "a boolean", validators::boolean()));
///
/// let mut target = json!({ "name": "demo", "verbose": "stale" });
/// merge_options_into(
///     &schema,
///     Some(&json!({ "verbose": true })),
///     &mut target,
///     &MergeSettings::default(),
///     &mut TracingSink,
/// )
/// .unwrap();
/// assert_eq!(target, json!({ "name": "demo", "verbose": true }));
/// ```
pub fn merge_options_into(
    schema: &OptionSchema,
    user_options: Option<&Value>,
    target: &mut Value,
    settings: &MergeSettings,
    sink: &mut dyn DiagnosticSink,
) -> Result<()> {
    validate_schema(schema)?;
    let empty = OptionMap::new();
    let user = match user_options {
        Some(value) => expect_object("user_options", value)?,
        None => &empty,
    };
    let target = expect_object_mut("target", target)?;

    let resolved = resolve(schema, user, settings, sink)?;
    target.extend(resolved);
    Ok(())
}

/// Merges user options and returns the diagnostics alongside the result.
///
/// # Errors
///
/// Same as [`merge_options`].
pub fn merge_options_collect(
    schema: &OptionSchema,
    user_options: Option<&Value>,
    settings: &MergeSettings,
) -> Result<(OptionMap, Vec<Diagnostic>)> {
    let mut collector = DiagnosticCollector::new();
    let resolved = merge_options(schema, user_options, settings, &mut collector)?;
    Ok((resolved, collector.into_inner()))
}

fn resolve(
    schema: &OptionSchema,
    user: &OptionMap,
    settings: &MergeSettings,
    sink: &mut dyn DiagnosticSink,
) -> Result<OptionMap> {
    let mut resolved = OptionMap::new();

    for (key, option) in schema.iter() {
        let required = is_required(key, option, user)?;

        match user.get(key) {
            None if required => {
                return Err(MergeError::MissingRequired {
                    key: key.to_string(),
                    description: option.description.clone(),
                    prefix: settings.prefix.clone(),
                    suffix: settings.suffix.clone(),
                });
            }
            None => {
                if let Some(default) = &option.default {
                    debug!(key, "option absent, using default");
                    resolved.insert(key.to_string(), default.clone());
                }
            }
            Some(value) => {
                let accepted = option.validator.guarded(value, user).map_err(|message| {
                    MergeError::ValidatorPanicked {
                        key: key.to_string(),
                        message,
                    }
                })?;

                if accepted {
                    debug!(key, "option accepted");
                    resolved.insert(key.to_string(), value.clone());
                    continue;
                }

                match &option.default {
                    Some(default) if !settings.strict && !required => {
                        sink.emit(&Diagnostic {
                            key: key.to_string(),
                            description: option.description.clone(),
                            observed: value.clone(),
                            default: default.clone(),
                            prefix: settings.prefix.clone(),
                            suffix: settings.suffix.clone(),
                        });
                        resolved.insert(key.to_string(), default.clone());
                    }
                    _ => {
                        return Err(MergeError::ValidationFailed {
                            key: key.to_string(),
                            description: option.description.clone(),
                            observed_type: value_kind(value).to_string(),
                            observed: render_value(value),
                            prefix: settings.prefix.clone(),
                            suffix: settings.suffix.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(resolved)
}

fn is_required(key: &str, option: &OptionDescriptor, user: &OptionMap) -> Result<bool> {
    match &option.required {
        Requirement::Never => Ok(false),
        Requirement::Always => Ok(true),
        Requirement::ConditionalOn(predicate) => {
            predicate
                .guarded(user)
                .map_err(|message| MergeError::ValidatorPanicked {
                    key: key.to_string(),
                    message,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{RequiredPredicate, Validator, validators};

    use super::*;

    fn threshold_schema() -> OptionSchema {
        OptionSchema::new().with_option(
            "threshold",
            OptionDescriptor::optional(
                json!(0),
                "a number between 0 and 1",
                validators::number_in_range(0.0, 1.0),
            ),
        )
    }

    #[test]
    fn test_merge_accepts_valid_value() {
        let (resolved, diagnostics) = merge_options_collect(
            &threshold_schema(),
            Some(&json!({ "threshold": 0.5 })),
            &MergeSettings::default(),
        )
        .unwrap();

        assert_eq!(resolved.get("threshold"), Some(&json!(0.5)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_merge_lenient_falls_back_with_diagnostic() {
        let (resolved, diagnostics) = merge_options_collect(
            &threshold_schema(),
            Some(&json!({ "threshold": 3 })),
            &MergeSettings::lenient(),
        )
        .unwrap();

        assert_eq!(resolved.get("threshold"), Some(&json!(0)));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].observed, json!(3));
        assert_eq!(
            diagnostics[0].message(),
            "threshold expected a number between 0 and 1, got number 3. \
             Falling back to default value 0."
        );
    }

    #[test]
    fn test_merge_strict_rejects_invalid_value() {
        let err = merge_options_collect(
            &threshold_schema(),
            Some(&json!({ "threshold": 3 })),
            &MergeSettings::strict().with_prefix("[t] "),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "[t] threshold expected a number between 0 and 1, got number 3."
        );
    }

    #[test]
    fn test_merge_missing_required_is_fatal_in_both_modes() {
        let schema = OptionSchema::new()
            .with_option("apiKey", OptionDescriptor::required("a string", validators::string()));

        for settings in [MergeSettings::strict(), MergeSettings::lenient()] {
            let err = merge_options_collect(&schema, Some(&json!({})), &settings).unwrap_err();
            assert!(matches!(err, MergeError::MissingRequired { ref key, .. } if key == "apiKey"));
        }
    }

    #[test]
    fn test_merge_rejected_required_value_is_fatal_when_lenient() {
        let schema = OptionSchema::new()
            .with_option("apiKey", OptionDescriptor::required("a string", validators::string()));

        let user = json!({ "apiKey": 7 });
        let err =
            merge_options_collect(&schema, Some(&user), &MergeSettings::lenient()).unwrap_err();
        assert!(matches!(err, MergeError::ValidationFailed { .. }));
    }

    #[test]
    fn test_conditional_requirement_follows_siblings() {
        let schema = OptionSchema::new()
            .with_option(
                "endpoint",
                OptionDescriptor::optional(
                    json!(null),
                    "a URL string",
                    validators::nullable(validators::string()),
                ),
            )
            .with_option(
                "token",
                OptionDescriptor::required_if(
                    json!("anonymous"),
                    "a string",
                    validators::string(),
                    RequiredPredicate::new(|opts| opts.contains_key("endpoint")),
                ),
            );

        let (resolved, _) =
            merge_options_collect(&schema, None, &MergeSettings::default()).unwrap();
        assert_eq!(
            Value::Object(resolved),
            json!({ "endpoint": null, "token": "anonymous" })
        );

        let user = json!({ "endpoint": "https://example.test", "token": 3 });
        let err = merge_options_collect(&schema, Some(&user), &MergeSettings::lenient())
            .unwrap_err();
        assert!(matches!(err, MergeError::ValidationFailed { ref key, .. } if key == "token"));

        let (resolved, diagnostics) =
            merge_options_collect(&schema, Some(&json!({ "token": 3 })), &MergeSettings::lenient())
                .unwrap();
        assert_eq!(resolved.get("token"), Some(&json!("anonymous")));
        assert_eq!(diagnostics.len(), 1);

        let err = merge_options_collect(
            &schema,
            Some(&json!({ "endpoint": "https://example.test" })),
            &MergeSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.subject(), "token");
    }

    #[test]
    fn test_validator_sees_raw_user_options() {
        let schema = OptionSchema::new()
            .with_option(
                "mode",
                OptionDescriptor::optional(
                    json!("fast"),
                    "fast or slow",
                    validators::one_of([json!("fast"), json!("slow")]),
                ),
            )
            .with_option(
                "depth",
                OptionDescriptor::optional(
                    json!(1),
                    "a depth, only with slow mode",
                    Validator::new(|v, opts| {
                        v.is_u64() && opts.get("mode") == Some(&json!("slow"))
                    }),
                ),
            );

        let user = json!({ "mode": "slow", "depth": 4 });
        let (resolved, _) =
            merge_options_collect(&schema, Some(&user), &MergeSettings::default()).unwrap();
        assert_eq!(resolved.get("depth"), Some(&json!(4)));

        let user = json!({ "depth": 4 });
        let (resolved, diagnostics) =
            merge_options_collect(&schema, Some(&user), &MergeSettings::lenient()).unwrap();
        assert_eq!(resolved.get("depth"), Some(&json!(1)));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_panicking_required_predicate_is_reported() {
        let schema = OptionSchema::new().with_option(
            "token",
            OptionDescriptor::required_if(
                json!(""),
                "a string",
                validators::string(),
                RequiredPredicate::new(|opts| opts["flag"].as_bool().unwrap()),
            ),
        );

        let err = merge_options_collect(&schema, Some(&json!({})), &MergeSettings::default())
            .unwrap_err();
        assert!(matches!(err, MergeError::ValidatorPanicked { ref key, .. } if key == "token"));
    }

    #[test]
    fn test_merge_rejects_non_object_user_options() {
        let err = merge_options_collect(
            &threshold_schema(),
            Some(&Value::Null),
            &MergeSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.subject(), "user_options");
    }

    #[test]
    fn test_merge_into_leaves_target_untouched_on_error() {
        let mut target = json!({ "threshold": 0.25, "other": "keep" });
        let err = merge_options_into(
            &threshold_schema(),
            Some(&json!({ "threshold": "high" })),
            &mut target,
            &MergeSettings::strict(),
            &mut PanicSink,
        );

        assert!(err.is_err());
        assert_eq!(target, json!({ "threshold": 0.25, "other": "keep" }));
    }

    #[test]
    fn test_merge_into_rejects_array_target() {
        let mut target = json!([]);
        let err = merge_options_into(
            &threshold_schema(),
            None,
            &mut target,
            &MergeSettings::default(),
            &mut PanicSink,
        )
        .unwrap_err();
        assert_eq!(err.subject(), "target");
    }

    struct PanicSink;

    impl DiagnosticSink for PanicSink {
        fn emit(&mut self, diagnostic: &Diagnostic) {
            panic!("unexpected diagnostic: {diagnostic}");
        }
    }
}
