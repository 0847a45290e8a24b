//! Performance summarizer: scores a finished session's raw counters.
//!
//! Every function here is pure. The same [`SessionSummary`] always yields the
//! same [`PerformanceSummary`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::exercises::{HEAD_TILT, SHOULDER_ELEVATION, SPEED_TOO_FAST};
use crate::session::SessionSummary;

/// Suggestion added when too few error-specific ones were generated
pub const GENERIC_SUGGESTION: &str = "Practice in front of a mirror to better visualize your form.";

/// Minimum number of suggestions before the generic one is no longer added
const MIN_SUGGESTIONS: usize = 2;

/// Per error type penalty weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryWeights {
    pub weights: HashMap<String, f64>,
    /// Weight for error types without an explicit entry
    pub default_weight: f64,
}

impl Default for SummaryWeights {
    fn default() -> Self {
        let weights = [(SHOULDER_ELEVATION, 1.2), (HEAD_TILT, 1.5), (SPEED_TOO_FAST, 0.8)]
            .into_iter()
            .map(|(k, w)| (k.to_string(), w))
            .collect();

        Self {
            weights,
            default_weight: 1.0,
        }
    }
}

impl SummaryWeights {
    pub fn weight(&self, error_type: &str) -> f64 {
        self.weights.get(error_type).copied().unwrap_or(self.default_weight)
    }
}

/// Qualitative band for a form score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Poor,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl PerformanceLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => PerformanceLevel::Excellent,
            75..=89 => PerformanceLevel::Good,
            60..=74 => PerformanceLevel::Average,
            40..=59 => PerformanceLevel::NeedsImprovement,
            _ => PerformanceLevel::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Average => "Average",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
            PerformanceLevel::Poor => "Poor",
            PerformanceLevel::NotAvailable => "Not Available",
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored end-of-session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub exercise_id: String,
    pub rep_count: u32,
    /// Seconds
    pub duration: f64,
    pub form_score: u32,
    pub performance_level: PerformanceLevel,
    /// Seconds
    pub average_time_per_rep: f64,
    /// Percent of reps on which each error type appeared
    pub error_frequency: BTreeMap<String, u32>,
    pub improvement_suggestions: Vec<String>,
    pub completed: bool,
}

impl PerformanceSummary {
    /// Score a session with the default weights
    pub fn from_session(session: &SessionSummary) -> Self {
        Self::with_weights(session, &SummaryWeights::default())
    }

    pub fn with_weights(session: &SessionSummary, weights: &SummaryWeights) -> Self {
        let form_score = form_score(session.rep_count, &session.error_counts, weights);
        let duration = session.duration_ms as f64 / 1000.0;
        let average_time_per_rep = if session.rep_count > 0 {
            duration / session.rep_count as f64
        } else {
            0.0
        };

        Self {
            exercise_id: session.exercise_id.clone(),
            rep_count: session.rep_count,
            duration,
            form_score,
            performance_level: PerformanceLevel::from_score(form_score),
            average_time_per_rep,
            error_frequency: error_frequency(session.rep_count, &session.error_counts),
            improvement_suggestions: improvement_suggestions(&session.error_counts),
            completed: session.rep_count > 0,
        }
    }

    /// Placeholder for a session that produced no data at all
    pub fn unavailable(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            rep_count: 0,
            duration: 0.0,
            form_score: 100,
            performance_level: PerformanceLevel::NotAvailable,
            average_time_per_rep: 0.0,
            error_frequency: BTreeMap::new(),
            improvement_suggestions: vec!["No exercise data available".to_string()],
            completed: false,
        }
    }

    pub fn message(&self) -> String {
        summary_message(self)
    }
}

/// 100 minus the weighted errors per rep × 10 (penalty capped at 100).
///
/// A session without reps scores 100.
pub fn form_score(rep_count: u32, error_counts: &BTreeMap<String, u32>, weights: &SummaryWeights) -> u32 {
    if rep_count == 0 {
        return 100;
    }

    let weighted: f64 = error_counts
        .iter()
        .map(|(kind, &count)| count as f64 * weights.weight(kind))
        .sum();

    let penalty = (weighted / rep_count as f64 * 10.0).min(100.0);
    (100.0 - penalty).round().max(0.0) as u32
}

/// Rounded percent of reps per error type; empty without reps
pub fn error_frequency(rep_count: u32, error_counts: &BTreeMap<String, u32>) -> BTreeMap<String, u32> {
    if rep_count == 0 {
        return BTreeMap::new();
    }

    error_counts
        .iter()
        .map(|(kind, &count)| {
            let pct = (100.0 * count as f64 / rep_count as f64).round() as u32;
            (kind.clone(), pct)
        })
        .collect()
}

/// Corrective advice for a known error type
pub fn suggestion_for(error_type: &str) -> Option<&'static str> {
    match error_type {
        SHOULDER_ELEVATION => {
            Some("Focus on keeping your shoulders relaxed and down throughout the exercise.")
        }
        HEAD_TILT => Some(
            "Keep your head level during the rotation - imagine a book balanced on top of your head.",
        ),
        SPEED_TOO_FAST => Some(
            "Slow down your movements. Aim for a smooth, controlled pace rather than quick jerky motions.",
        ),
        _ => None,
    }
}

/// One suggestion per recorded error type, padded with the generic one
pub fn improvement_suggestions(error_counts: &BTreeMap<String, u32>) -> Vec<String> {
    let mut suggestions: Vec<String> = error_counts
        .iter()
        .filter(|(_, &count)| count > 0)
        .filter_map(|(kind, _)| suggestion_for(kind))
        .map(String::from)
        .collect();

    if suggestions.len() < MIN_SUGGESTIONS {
        suggestions.push(GENERIC_SUGGESTION.to_string());
    }
    suggestions
}

/// `MM:SS` with partial seconds dropped; minutes are not wrapped at the hour
pub fn format_duration(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// One-line verdict shown at the top of the summary
pub fn summary_message(summary: &PerformanceSummary) -> String {
    if !summary.completed {
        return "Exercise session incomplete. Try completing at least one repetition.".to_string();
    }

    let reps = summary.rep_count;
    let score = summary.form_score;
    match summary.performance_level {
        PerformanceLevel::Excellent => format!(
            "Great job! You completed {} repetitions with excellent form ({}%).",
            reps, score
        ),
        PerformanceLevel::Good => format!(
            "Good work! You completed {} repetitions with good form ({}%).",
            reps, score
        ),
        PerformanceLevel::Average => format!(
            "You completed {} repetitions with average form ({}%). There's room for improvement.",
            reps, score
        ),
        _ => format!(
            "You completed {} repetitions, but your form needs improvement ({}%). Focus on the suggestions below.",
            reps, score
        ),
    }
}
