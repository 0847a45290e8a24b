//! Form-analysis vocabulary shared by every exercise rule set.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a form violation is. Ordering is `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A single detected form violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: Severity,
}

impl FormError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            severity,
        }
    }

    /// Feedback shown when a repetition completes
    pub fn rep_completed() -> Self {
        Self::new("success", "Good job! Rep completed correctly.", Severity::Low)
    }
}

/// Pick the error to surface as feedback: highest severity, first on ties
pub fn select_feedback(errors: &[FormError]) -> Option<&FormError> {
    errors.iter().fold(None, |best: Option<&FormError>, err| match best {
        Some(b) if b.severity >= err.severity => Some(b),
        _ => Some(err),
    })
}

/// One metric reading: a measurement or a discrete category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Category(String),
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Category(v.to_string())
    }
}

/// Exercise-specific metrics computed for one analyzed frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(MetricValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(MetricValue::Category(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of running an exercise's form analyzer on one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalysis {
    pub is_valid: bool,
    pub errors: Vec<FormError>,
    pub metrics: Metrics,
}

impl FormAnalysis {
    /// Analysis that could not run (missing current or baseline pose)
    pub fn incomplete() -> Self {
        Self {
            is_valid: false,
            errors: Vec::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn from_parts(errors: Vec<FormError>, metrics: Metrics) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            metrics,
        }
    }
}

/// Motion-phase tag from an exercise's phase vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase(Cow<'static, str>);

impl Phase {
    pub const NOT_STARTED: Phase = Phase::from_static("not_started");
    pub const STARTING: Phase = Phase::from_static("starting");
    pub const UNKNOWN: Phase = Phase::from_static("unknown");

    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Phase {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Phase {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
