//! Ready-made validators and required-predicates.
//!
//! Validators never coerce: they accept or reject the exact value given.
//!
//! # Examples
//!
//! ```
//! use option_merge_core::{OptionMap, validators};
//! use serde_json::json;
//!
//! let ctx = OptionMap::new();
//! assert!(validators::number_in_range(0.0, 1.0).test(&json!(0.5), &ctx));
//! assert!(!validators::number_in_range(0.0, 1.0).test(&json!("0.5"), &ctx));
//! assert!(validators::nullable(validators::string()).test(&json!(null), &ctx));
//! ```

use serde_json::Value;

use crate::{RequiredPredicate, Validator};

/// Accepts every value.
pub fn any() -> Validator {
    Validator::from_fn(|_| true)
}

/// Accepts `true` and `false`.
pub fn boolean() -> Validator {
    Validator::from_fn(Value::is_boolean)
}

/// Accepts any string.
pub fn string() -> Validator {
    Validator::from_fn(Value::is_string)
}

/// Accepts strings with at least one non-whitespace character.
pub fn non_empty_string() -> Validator {
    Validator::from_fn(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
}

/// Accepts any number.
pub fn number() -> Validator {
    Validator::from_fn(Value::is_number)
}

/// Accepts numbers without a fractional part, including `3.0`.
pub fn integer() -> Validator {
    Validator::from_fn(|v| v.as_f64().is_some_and(|n| n.fract() == 0.0))
}

/// Accepts numbers in `min..=max`.
pub fn number_in_range(min: f64, max: f64) -> Validator {
    Validator::from_fn(move |v| v.as_f64().is_some_and(|n| n >= min && n <= max))
}

/// Accepts values equal to one of `allowed`.
///
/// # Examples
///
/// ```
/// use option_merge_core::{OptionMap, validators};
/// use serde_json::json;
///
/// let format = validators::one_of([json!("json"), json!("yaml")]);
/// assert!(format.test(&json!("yaml"), &OptionMap::new()));
/// assert!(!format.test(&json!("toml"), &OptionMap::new()));
/// ```
pub fn one_of(allowed: impl IntoIterator<Item = Value>) -> Validator {
    let allowed: Vec<Value> = allowed.into_iter().collect();
    Validator::from_fn(move |v| allowed.contains(v))
}

/// Accepts arrays.
pub fn array() -> Validator {
    Validator::from_fn(Value::is_array)
}

/// Accepts objects.
pub fn object() -> Validator {
    Validator::from_fn(Value::is_object)
}

/// Accepts `null` or anything `inner` accepts.
pub fn nullable(inner: Validator) -> Validator {
    Validator::new(move |v, ctx| v.is_null() || inner.test(v, ctx))
}

/// Accepts what `inner` accepts, but only when `key` is also supplied.
///
/// # Examples
///
/// ```
/// use option_merge_core::{OptionMap, validators};
/// use serde_json::json;
///
/// let port = validators::when_present("host", validators::integer());
/// let mut ctx = OptionMap::new();
/// assert!(!port.test(&json!(8080), &ctx));
/// ctx.insert("host".into(), json!("localhost"));
/// assert!(port.test(&json!(8080), &ctx));
/// ```
pub fn when_present(key: impl Into<String>, inner: Validator) -> Validator {
    let key = key.into();
    Validator::new(move |v, ctx| ctx.contains_key(&key) && inner.test(v, ctx))
}

/// Requires the option whenever `key` is supplied.
pub fn required_when_present(key: impl Into<String>) -> RequiredPredicate {
    let key = key.into();
    RequiredPredicate::new(move |ctx| ctx.contains_key(&key))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{OptionMap, probe_values};

    use super::*;

    #[test]
    fn test_builtin_validators_handle_every_probe() {
        let all = [
            any(),
            boolean(),
            string(),
            non_empty_string(),
            number(),
            integer(),
            number_in_range(-1.0, 1.0),
            one_of([json!(1)]),
            array(),
            object(),
            nullable(number()),
            when_present("other", any()),
        ];
        let ctx = OptionMap::new();
        for validator in &all {
            for probe in probe_values() {
                assert!(validator.guarded(&probe, &ctx).is_ok());
            }
        }
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        let ctx = OptionMap::new();
        assert!(integer().test(&json!(3), &ctx));
        assert!(integer().test(&json!(3.0), &ctx));
        assert!(!integer().test(&json!(3.5), &ctx));
        assert!(!integer().test(&json!("3"), &ctx));
    }

    #[test]
    fn test_non_empty_string_rejects_whitespace() {
        let ctx = OptionMap::new();
        assert!(non_empty_string().test(&json!("x"), &ctx));
        assert!(!non_empty_string().test(&json!("  "), &ctx));
    }

    #[test]
    fn test_number_in_range_is_inclusive() {
        let ctx = OptionMap::new();
        let unit = number_in_range(0.0, 1.0);
        assert!(unit.test(&json!(0), &ctx));
        assert!(unit.test(&json!(1), &ctx));
        assert!(!unit.test(&json!(1.01), &ctx));
        assert!(!unit.test(&json!(null), &ctx));
    }

    #[test]
    fn test_required_when_present() {
        let predicate = required_when_present("endpoint");
        let mut ctx = OptionMap::new();
        assert!(!predicate.test(&ctx));
        ctx.insert("endpoint".into(), json!(null));
        assert!(predicate.test(&ctx));
    }
}
