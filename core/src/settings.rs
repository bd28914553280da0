//! Per-invocation merge settings.
//!
//! [`MergeSettings`] carries the message framing strings and the strict
//! flag. It can be built in code, parsed from an untyped
//! [`serde_json::Value`] with field-level checks, or loaded from a YAML or
//! JSON file.
//!
//! # Example YAML
//!
//! ```yaml
//! prefix: "[my-tool] "
//! suffix: " See https://example.test/docs/options"
//! strict: false
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SettingsError};
use crate::validate::{expect_object, expect_optional_bool, expect_optional_string};

/// Message framing and mode for one merge.
///
/// Strict by default: a rejected value aborts the merge. In lenient mode
/// the default is substituted and a [`Diagnostic`](crate::Diagnostic) is
/// emitted instead.
///
/// # Examples
///
/// ```
/// use option_merge_core::MergeSettings;
///
/// let settings = MergeSettings::default();
/// assert!(settings.strict);
/// assert!(settings.prefix.is_empty());
///
/// let lenient = MergeSettings::lenient().with_prefix("[tool] ");
/// assert!(!lenient.strict);
/// assert_eq!(lenient.prefix, "[tool] ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Text placed before every error or warning message.
    pub prefix: String,
    /// Text placed after every error or warning message.
    pub suffix: String,
    /// Abort on rejected values instead of falling back to defaults.
    pub strict: bool,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            strict: true,
        }
    }
}

impl MergeSettings {
    /// Strict settings with empty framing.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Lenient settings with empty framing.
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Sets the message prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the message suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets the strict flag.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads settings from an untyped value.
    ///
    /// `null` yields the defaults. Absent or `null` fields keep their
    /// defaults; unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationMalformed`](crate::MergeError::InvocationMalformed)
    /// naming `settings`, `prefix`, `suffix` or `strict`.
    ///
    /// # Examples
    ///
    /// ```
    /// use option_merge_core::{MergeError, MergeSettings};
    /// use serde_json::json;
    ///
    /// let settings = MergeSettings::from_value(&json!({ "suffix": "!", "strict": false })).unwrap();
    /// assert_eq!(settings.suffix, "!");
    /// assert!(!settings.strict);
    ///
    /// let err = MergeSettings::from_value(&json!({ "prefix": 42 })).unwrap_err();
    /// assert!(matches!(err, MergeError::InvocationMalformed { ref parameter, .. } if parameter == "prefix"));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut settings = Self::default();
        if value.is_null() {
            return Ok(settings);
        }

        let fields = expect_object("settings", value)?;
        if let Some(prefix) = expect_optional_string("prefix", fields.get("prefix"))? {
            settings.prefix = prefix.to_string();
        }
        if let Some(suffix) = expect_optional_string("suffix", fields.get("suffix"))? {
            settings.suffix = suffix.to_string();
        }
        if let Some(strict) = expect_optional_bool("strict", fields.get("strict"))? {
            settings.strict = strict;
        }
        Ok(settings)
    }

    /// Loads settings from a file.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML; anything else
    /// is parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](SettingsError::IoError) if the file cannot be
    /// read, a parse error for malformed documents, or
    /// [`Invalid`](SettingsError::Invalid) for fields of the wrong type.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use option_merge_core::MergeSettings;
    ///
    /// let settings = MergeSettings::load("merge-settings.yml").unwrap();
    /// println!("strict mode: {}", settings.strict);
    /// ```
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, SettingsError> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let document: Value = if is_yaml {
            serde_yaml::from_reader(reader)?
        } else {
            serde_json::from_reader(reader)?
        };
        Ok(Self::from_value(&document)?)
    }
}
