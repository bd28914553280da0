//! Non-fatal diagnostics emitted in lenient mode.
//!
//! When a supplied value fails validation and strict mode is off, the merge
//! substitutes the default and hands a [`Diagnostic`] to a
//! [`DiagnosticSink`]. The sink is injected by the caller; [`TracingSink`]
//! forwards to `tracing` and [`DiagnosticCollector`] keeps them in memory.
//!
//! # Examples
//!
//! ```
//! use option_merge_core::Diagnostic;
//! use serde_json::json;
//!
//! let diagnostic = Diagnostic {
//!     key: "threshold".into(),
//!     description: "a number between 0 and 1".into(),
//!     observed: json!(3),
//!     default: json!(0),
//!     prefix: String::new(),
//!     suffix: String::new(),
//! };
//! assert_eq!(
//!     diagnostic.message(),
//!     "threshold expected a number between 0 and 1, got number 3. Falling back to default value 0."
//! );
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{render_value, value_kind};

/// One rejected value that was replaced by its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Option key.
    pub key: String,
    /// Descriptor description.
    pub description: String,
    /// Value the user supplied.
    pub observed: Value,
    /// Default that was substituted.
    pub default: Value,
    /// Caller-supplied message prefix.
    pub prefix: String,
    /// Caller-supplied message suffix.
    pub suffix: String,
}

impl Diagnostic {
    /// Reported type of the observed value.
    pub fn observed_type(&self) -> &'static str {
        value_kind(&self.observed)
    }

    /// Renders the human-readable message.
    pub fn message(&self) -> String {
        format!(
            "{}{} expected {}, got {} {}. Falling back to default value {}.{}",
            self.prefix,
            self.key,
            self.description,
            self.observed_type(),
            render_value(&self.observed),
            render_value(&self.default),
            self.suffix,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Receiver for lenient-mode diagnostics.
///
/// Any `FnMut(&Diagnostic)` closure is a sink.
pub trait DiagnosticSink {
    /// Called once per rejected value.
    fn emit(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Sink that logs each diagnostic as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        tracing::warn!(
            key = %diagnostic.key,
            observed_type = diagnostic.observed_type(),
            observed = %render_value(&diagnostic.observed),
            default = %render_value(&diagnostic.default),
            "{}",
            diagnostic.message()
        );
    }
}

/// Sink that stores diagnostics in emission order.
///
/// # Examples
///
/// ```
/// use option_merge_core::{Diagnostic, DiagnosticCollector, DiagnosticSink};
/// use serde_json::json;
///
/// let mut collector = DiagnosticCollector::new();
/// collector.emit(&Diagnostic {
///     key: "mode".into(),
///     description: "fast or slow".into(),
///     observed: json!("medium"),
///     default: json!("fast"),
///     prefix: String::new(),
///     suffix: String::new(),
/// });
/// assert_eq!(collector.len(), 1);
/// assert_eq!(collector.into_inner()[0].key, "mode");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Consumes the collector.
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}
