//! Session history store.

use parking_lot::RwLock;
use physio_core::{Error, Result, SessionId, Timestamp};
use physio_engine::PerformanceSummary;
use serde::{Deserialize, Serialize};

/// Sessions compared when judging the recent trend
const TREND_WINDOW: usize = 3;

/// One finished session as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub exercise_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    pub timestamp: Timestamp,
    pub summary: PerformanceSummary,
}

/// Direction of the last few form scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    /// Fewer than three sessions
    None,
}

impl Trend {
    fn from_scores(scores: &[u32]) -> Self {
        if scores.len() < TREND_WINDOW {
            return Trend::None;
        }

        let recent = &scores[scores.len() - TREND_WINDOW..];
        let (first, last) = (recent[0], recent[TREND_WINDOW - 1]);
        match last.cmp(&first) {
            std::cmp::Ordering::Greater => Trend::Improving,
            std::cmp::Ordering::Less => Trend::Declining,
            std::cmp::Ordering::Equal => Trend::Stable,
        }
    }
}

/// Form score of one session, for charting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub timestamp: Timestamp,
    pub score: u32,
}

/// Aggregate progress on one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
    pub sessions_completed: usize,
    pub total_reps: u64,
    pub average_form_score: f64,
    pub form_score_progress: Vec<ScorePoint>,
    pub recent_trend: Trend,
}

/// Thread-safe, in-memory session log
#[derive(Debug, Default)]
pub struct SessionHistory {
    records: RwLock<Vec<SessionRecord>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, exercise_name: Option<String>, summary: PerformanceSummary) -> Result<SessionRecord> {
        self.record_at(exercise_name, summary, Timestamp::now())
    }

    /// Append a finished session, assigning it a fresh id
    pub fn record_at(
        &self,
        exercise_name: Option<String>,
        summary: PerformanceSummary,
        timestamp: Timestamp,
    ) -> Result<SessionRecord> {
        if summary.exercise_id.trim().is_empty() {
            return Err(Error::InvalidInput("exercise id is required".into()));
        }

        let record = SessionRecord {
            id: SessionId::new(),
            exercise_id: summary.exercise_id.clone(),
            exercise_name,
            timestamp,
            summary,
        };

        self.records.write().push(record.clone());
        tracing::info!(
            "Recorded {} for {} (score {})",
            record.id,
            record.exercise_id,
            record.summary.form_score
        );

        Ok(record)
    }

    /// Every record, in insertion order
    pub fn all(&self) -> Vec<SessionRecord> {
        self.records.read().clone()
    }

    pub fn get(&self, id: SessionId) -> Result<SessionRecord> {
        self.records
            .read()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Records for one exercise, oldest first
    pub fn for_exercise(&self, exercise_id: &str) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.exercise_id == exercise_id)
            .cloned()
            .collect();

        records.sort_by_key(|r| r.timestamp);
        records
    }

    pub fn delete(&self, id: SessionId) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = records.len() != before;

        if removed {
            tracing::debug!("Deleted {}", id);
        }
        removed
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Highest form score for the exercise; the earliest wins a tie
    pub fn best_performance(&self, exercise_id: &str) -> Option<SessionRecord> {
        self.for_exercise(exercise_id)
            .into_iter()
            .fold(None, |best: Option<SessionRecord>, record| match best {
                Some(b) if b.summary.form_score >= record.summary.form_score => Some(b),
                _ => Some(record),
            })
    }

    /// Progress statistics for one exercise, `None` without any sessions
    pub fn progress(&self, exercise_id: &str) -> Option<ExerciseProgress> {
        let records = self.for_exercise(exercise_id);
        if records.is_empty() {
            return None;
        }

        let scores: Vec<u32> = records.iter().map(|r| r.summary.form_score).collect();
        let total_score: u64 = scores.iter().map(|&s| u64::from(s)).sum();

        Some(ExerciseProgress {
            sessions_completed: records.len(),
            total_reps: records.iter().map(|r| u64::from(r.summary.rep_count)).sum(),
            average_form_score: total_score as f64 / records.len() as f64,
            form_score_progress: records
                .iter()
                .map(|r| ScorePoint {
                    timestamp: r.timestamp,
                    score: r.summary.form_score,
                })
                .collect(),
            recent_trend: Trend::from_scores(&scores),
        })
    }

    /// Snapshot of every record as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&*self.records.read())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<SessionRecord> = serde_json::from_str(json)?;
        Ok(Self {
            records: RwLock::new(records),
        })
    }
}
