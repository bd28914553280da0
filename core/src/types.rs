//! Option schema type definitions.
//!
//! This module defines the data model used to describe recognized option
//! keys: how each key is validated, what it falls back to, and whether it
//! must be supplied. Values are plain [`serde_json::Value`]s so that option
//! maps can come straight from JSON, YAML or hand-built literals.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::{Map, Value};

/// Map from option name to raw or resolved value.
///
/// Built on serde_json's order-preserving map, so iteration follows
/// insertion order.
pub type OptionMap = Map<String, Value>;

type ValidatorFn = dyn Fn(&Value, &OptionMap) -> bool + Send + Sync;
type PredicateFn = dyn Fn(&OptionMap) -> bool + Send + Sync;

/// Predicate deciding whether a supplied value is acceptable.
///
/// The second argument is the full raw user option map, which allows
/// cross-key checks ("valid only if another key has a particular value").
///
/// # Examples
///
/// ```
/// use option_merge_core::{OptionMap, Validator};
/// use serde_json::json;
///
/// let positive = Validator::from_fn(|v| v.as_f64().is_some_and(|n| n > 0.0));
/// assert!(positive.test(&json!(2), &OptionMap::new()));
/// assert!(!positive.test(&json!("2"), &OptionMap::new()));
/// ```
///
/// # Panics
///
/// The engine catches a panicking validator and reports it as an error,
/// but the process panic hook still runs first. With the default hook that
/// prints a `thread '…' panicked at …` line to stderr. Install a quiet hook
/// with [`std::panic::set_hook`] if that output is unwanted.
#[derive(Clone)]
pub struct Validator(Arc<ValidatorFn>);

impl Validator {
    /// Wraps a predicate that receives the value and the raw user options.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &OptionMap) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a predicate that only looks at the value itself.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |value, _| f(value)))
    }

    /// Runs the predicate directly.
    pub fn test(&self, value: &Value, context: &OptionMap) -> bool {
        (self.0)(value, context)
    }

    /// Runs the predicate, turning a panic into an error message.
    pub(crate) fn guarded(&self, value: &Value, context: &OptionMap) -> Result<bool, String> {
        catch_unwind(AssertUnwindSafe(|| (self.0)(value, context))).map_err(panic_message)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Predicate over the full raw user option map deciding whether a key is
/// required under the current configuration.
///
/// # Examples
///
/// ```
/// use option_merge_core::{OptionMap, RequiredPredicate};
/// use serde_json::json;
///
/// let needs_token = RequiredPredicate::new(|opts| opts.contains_key("endpoint"));
/// let mut opts = OptionMap::new();
/// assert!(!needs_token.test(&opts));
/// opts.insert("endpoint".into(), json!("https://example.test"));
/// assert!(needs_token.test(&opts));
/// ```
#[derive(Clone)]
pub struct RequiredPredicate(Arc<PredicateFn>);

impl RequiredPredicate {
    /// Wraps a predicate over the raw user options.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&OptionMap) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the predicate directly.
    pub fn test(&self, user_options: &OptionMap) -> bool {
        (self.0)(user_options)
    }

    pub(crate) fn guarded(&self, user_options: &OptionMap) -> Result<bool, String> {
        catch_unwind(AssertUnwindSafe(|| (self.0)(user_options))).map_err(panic_message)
    }
}

impl fmt::Debug for RequiredPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequiredPredicate(..)")
    }
}

/// Whether an option must be supplied by the user.
#[derive(Debug, Clone, Default)]
pub enum Requirement {
    /// Optional; the descriptor must carry a default.
    #[default]
    Never,
    /// Always required; the descriptor must not carry a default.
    Always,
    /// Required when the predicate holds for the raw user options. The
    /// descriptor must carry the default used when it does not.
    ConditionalOn(RequiredPredicate),
}

impl Requirement {
    /// Returns `true` when the key can resolve without user input, which
    /// is every requirement except [`Always`](Requirement::Always).
    pub fn needs_default(&self) -> bool {
        !matches!(self, Requirement::Always)
    }
}

/// Describes one recognized option key.
///
/// Use [`optional`](OptionDescriptor::optional),
/// [`required`](OptionDescriptor::required) and
/// [`required_if`](OptionDescriptor::required_if) for well-formed
/// descriptors. The fields are public so unusual combinations can still be
/// assembled; [`validate_schema`](crate::validate_schema) rejects the
/// malformed ones.
///
/// # Examples
///
/// ```
/// use option_merge_core::{OptionDescriptor, Requirement, validators};
/// use serde_json::json;
///
/// let threshold = OptionDescriptor::optional(
///     json!(0),
///     "a number between 0 and 1",
///     validators::number_in_range(0.0, 1.0),
/// );
/// assert_eq!(threshold.default, Some(json!(0)));
/// assert!(matches!(threshold.required, Requirement::Never));
///
/// let api_key = OptionDescriptor::required("a string", validators::string());
/// assert!(api_key.default.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct OptionDescriptor {
    /// Human-readable description used verbatim in messages.
    pub description: String,
    /// Acceptance predicate for supplied values.
    pub validator: Validator,
    /// Fallback value for keys that are not always required.
    pub default: Option<Value>,
    /// Required-ness of the key.
    pub required: Requirement,
}

impl OptionDescriptor {
    /// Creates an optional key with a default.
    pub fn optional(default: Value, description: &str, validator: Validator) -> Self {
        Self {
            description: description.to_string(),
            validator,
            default: Some(default),
            required: Requirement::Never,
        }
    }

    /// Creates an always-required key.
    pub fn required(description: &str, validator: Validator) -> Self {
        Self {
            description: description.to_string(),
            validator,
            default: None,
            required: Requirement::Always,
        }
    }

    /// Creates a key that is required when `predicate` holds and falls
    /// back to `default` when it does not.
    pub fn required_if(
        default: Value,
        description: &str,
        validator: Validator,
        predicate: RequiredPredicate,
    ) -> Self {
        Self {
            description: description.to_string(),
            validator,
            default: Some(default),
            required: Requirement::ConditionalOn(predicate),
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Ordered collection of option descriptors keyed by option name.
///
/// Inserting an existing key replaces its descriptor but keeps its
/// position, so merge order is always first-insertion order.
///
/// # Examples
///
/// ```
/// use option_merge_core::{OptionDescriptor, OptionSchema, validators};
/// use serde_json::json;
///
/// let schema = OptionSchema::new()
///     .with_option("verbose", OptionDescriptor::optional(json!(false), "a boolean", validators::boolean()))
///     .with_option("name", OptionDescriptor::required("a string", validators::string()));
///
/// assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["verbose", "name"]);
/// assert!(schema.get("name").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptionSchema {
    entries: Vec<(String, OptionDescriptor)>,
}

impl OptionSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a descriptor, returning the one it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        descriptor: OptionDescriptor,
    ) -> Option<OptionDescriptor> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, descriptor)),
            None => {
                self.entries.push((key, descriptor));
                None
            }
        }
    }

    /// Adds a descriptor (builder form of [`insert`](OptionSchema::insert)).
    pub fn with_option(mut self, key: impl Into<String>, descriptor: OptionDescriptor) -> Self {
        self.insert(key, descriptor);
        self
    }

    /// Looks up a descriptor by key.
    pub fn get(&self, key: &str) -> Option<&OptionDescriptor> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, descriptor)| descriptor)
    }

    /// Returns `true` if the schema recognizes `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over keys in schema order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over entries in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionDescriptor)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Number of recognized keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the schema has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, OptionDescriptor)> for OptionSchema {
    fn from_iter<I: IntoIterator<Item = (K, OptionDescriptor)>>(iter: I) -> Self {
        let mut schema = OptionSchema::new();
        for (key, descriptor) in iter {
            schema.insert(key, descriptor);
        }
        schema
    }
}

/// Reported type name of a value, as used in messages.
///
/// # Examples
///
/// ```
/// use option_merge_core::value_kind;
/// use serde_json::json;
///
/// assert_eq!(value_kind(&json!(null)), "null");
/// assert_eq!(value_kind(&json!([1, 2])), "array");
/// assert_eq!(value_kind(&json!(3)), "number");
/// ```
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value for messages: strings as-is, everything else as compact
/// JSON.
///
/// # Examples
///
/// ```
/// use option_merge_core::render_value;
/// use serde_json::json;
///
/// assert_eq!(render_value(&json!("fast")), "fast");
/// assert_eq!(render_value(&json!({"a": 1})), r#"{"a":1}"#);
/// ```
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn boolean() -> Validator {
        Validator::from_fn(Value::is_boolean)
    }

    #[test]
    fn test_schema_insert_replaces_in_place() {
        let mut schema = OptionSchema::new();
        schema.insert("a", OptionDescriptor::optional(json!(1), "first", boolean()));
        schema.insert("b", OptionDescriptor::optional(json!(2), "second", boolean()));
        let replaced = schema.insert("a", OptionDescriptor::optional(json!(3), "third", boolean()));

        assert_eq!(replaced.map(|d| d.description), Some("first".to_string()));
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(schema.get("a").unwrap().default, Some(json!(3)));
    }

    #[test]
    fn test_schema_from_iterator_keeps_order() {
        let schema: OptionSchema = vec![
            ("z", OptionDescriptor::optional(json!(0), "z", boolean())),
            ("a", OptionDescriptor::optional(json!(0), "a", boolean())),
        ]
        .into_iter()
        .collect();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn test_guarded_validator_reports_panic() {
        let validator = Validator::from_fn(|v| v.as_str().expect("must be a string").is_empty());
        let result = validator.guarded(&json!(1), &OptionMap::new());
        assert_eq!(result, Err("must be a string".to_string()));
        assert_eq!(validator.guarded(&json!(""), &OptionMap::new()), Ok(true));
    }

    #[test]
    fn test_requirement_needs_default() {
        assert!(Requirement::Never.needs_default());
        assert!(!Requirement::Always.needs_default());
        assert!(Requirement::ConditionalOn(RequiredPredicate::new(|_| false)).needs_default());
    }

    #[test]
    fn test_render_value_and_kind() {
        assert_eq!(render_value(&json!(3)), "3");
        assert_eq!(render_value(&json!(0.5)), "0.5");
        assert_eq!(render_value(&json!(null)), "null");
        assert_eq!(value_kind(&json!("x")), "string");
        assert_eq!(value_kind(&json!(true)), "boolean");
        assert_eq!(value_kind(&json!({})), "object");
    }
}
