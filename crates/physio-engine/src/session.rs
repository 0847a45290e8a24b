//! Analysis session: the per-frame state machine that drives a rule set.
//!
//! ```text
//! idle ──start──▶ starting ──first analyzed frame──▶ active
//!                     │                                 │
//!                     └──────────────stop───────────────┴──▶ stopped
//! ```
//!
//! `reset` returns to idle from any state. Frames are only analyzed while
//! starting or active, at most once per `min_frame_interval_ms`.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use physio_core::{Pose, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::form::{select_feedback, FormAnalysis, FormError, Metrics, Phase};
use crate::rules::{ExerciseRegistry, ExerciseRules};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Starting,
    Active,
    Stopped,
}

impl SessionStatus {
    pub fn is_analyzing(&self) -> bool {
        matches!(self, SessionStatus::Starting | SessionStatus::Active)
    }
}

/// Why a submitted frame produced no analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAnalyzing,
    NoRuleSet,
    MissingPose,
    RateLimited,
    AnalysisFailed,
}

/// What happened to a submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Analyzed,
    RepCompleted { rep_count: u32 },
    Skipped(SkipReason),
}

impl FrameOutcome {
    pub fn was_analyzed(&self) -> bool {
        !matches!(self, FrameOutcome::Skipped(_))
    }
}

/// Live view of the session for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub exercise_phase: Phase,
    pub rep_count: u32,
    pub errors: Vec<FormError>,
    pub feedback: Option<FormError>,
    pub current_metrics: Metrics,
    pub is_analyzing: bool,
}

/// Raw session counters, before any scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercise_id: String,
    pub rep_count: u32,
    pub duration_ms: u64,
    pub average_time_per_rep_ms: f64,
    pub error_counts: BTreeMap<String, u32>,
    pub completed: bool,
}

/// Everything one accepted frame changes, computed before any state is touched
struct FrameStep {
    analysis: FormAnalysis,
    new_phase: Option<Phase>,
    phase_history: VecDeque<Phase>,
    rep_complete: bool,
}

/// Exercise analysis session for one exercise
pub struct AnalysisSession {
    exercise_id: String,
    rules: Option<Arc<dyn ExerciseRules>>,
    config: EngineConfig,

    status: SessionStatus,
    phase: Phase,
    phase_history: VecDeque<Phase>,
    rep_count: u32,
    errors: Vec<FormError>,
    feedback: Option<FormError>,
    current_metrics: Metrics,
    metrics_history: VecDeque<Metrics>,
    error_counts: BTreeMap<String, u32>,

    previous_pose: Option<Pose>,
    previous_metrics: Option<Metrics>,
    last_analyzed_at: Option<Timestamp>,
    started_at: Option<Timestamp>,
    duration_ms: u64,
    /// Phase changes since the last counted rep; `None` until the first rep
    phases_since_rep: Option<usize>,
}

impl AnalysisSession {
    /// Session for `exercise_id`; without a registered rule set frames are ignored
    pub fn new(exercise_id: impl Into<String>, registry: &ExerciseRegistry, config: EngineConfig) -> Self {
        let exercise_id = exercise_id.into();
        let rules = registry.get(&exercise_id);
        if rules.is_none() {
            tracing::warn!("No rule set registered for exercise {}, frames will be ignored", exercise_id);
        }
        Self::with_rules(exercise_id, rules, config)
    }

    /// Session for `exercise_id`, failing when no rule set is registered
    pub fn for_exercise(exercise_id: &str, registry: &ExerciseRegistry, config: EngineConfig) -> Result<Self> {
        let rules = registry.require(exercise_id)?;
        Ok(Self::with_rules(exercise_id.to_string(), Some(rules), config))
    }

    fn with_rules(exercise_id: String, rules: Option<Arc<dyn ExerciseRules>>, config: EngineConfig) -> Self {
        Self {
            exercise_id,
            rules,
            config,
            status: SessionStatus::Idle,
            phase: Phase::NOT_STARTED,
            phase_history: VecDeque::from([Phase::NOT_STARTED]),
            rep_count: 0,
            errors: Vec::new(),
            feedback: None,
            current_metrics: Metrics::new(),
            metrics_history: VecDeque::new(),
            error_counts: BTreeMap::new(),
            previous_pose: None,
            previous_metrics: None,
            last_analyzed_at: None,
            started_at: None,
            duration_ms: 0,
            phases_since_rep: None,
        }
    }

    pub fn start(&mut self) {
        self.start_at(Timestamp::now());
    }

    /// Begin (or restart) analysis, clearing all per-session state
    pub fn start_at(&mut self, now: Timestamp) {
        self.clear_progress();
        self.phase = Phase::STARTING;
        self.status = SessionStatus::Starting;
        self.started_at = Some(now);
        self.duration_ms = 0;

        tracing::info!("Started {} session", self.exercise_id);
    }

    pub fn stop(&mut self) {
        self.stop_at(Timestamp::now());
    }

    /// Stop analyzing and freeze the elapsed duration
    pub fn stop_at(&mut self, now: Timestamp) {
        if !self.status.is_analyzing() {
            return;
        }

        if let Some(started) = self.started_at {
            self.duration_ms = now.millis_since(started);
        }
        self.status = SessionStatus::Stopped;

        tracing::info!(
            "Stopped {} session after {}ms with {} reps",
            self.exercise_id,
            self.duration_ms,
            self.rep_count
        );
    }

    pub fn reset(&mut self) {
        self.reset_at(Timestamp::now());
    }

    /// Stop, then return every counter and history to its initial value
    pub fn reset_at(&mut self, now: Timestamp) {
        self.stop_at(now);
        self.clear_progress();
        self.phase = Phase::NOT_STARTED;
        self.status = SessionStatus::Idle;
        self.started_at = None;
        self.duration_ms = 0;

        tracing::info!("Reset {} session", self.exercise_id);
    }

    fn clear_progress(&mut self) {
        self.rep_count = 0;
        self.errors.clear();
        self.feedback = None;
        self.phase_history.clear();
        self.phase_history.push_back(Phase::NOT_STARTED);
        self.current_metrics = Metrics::new();
        self.metrics_history.clear();
        self.error_counts.clear();
        self.previous_pose = None;
        self.previous_metrics = None;
        self.last_analyzed_at = None;
        self.phases_since_rep = None;
    }

    pub fn submit_frame(&mut self, current: Option<&Pose>, initial: Option<&Pose>) -> FrameOutcome {
        self.submit_frame_at(current, initial, Timestamp::now())
    }

    /// Analyze one frame. Never fails: anything that prevents analysis is
    /// reported as [`FrameOutcome::Skipped`] and leaves the session unchanged.
    pub fn submit_frame_at(
        &mut self,
        current: Option<&Pose>,
        initial: Option<&Pose>,
        now: Timestamp,
    ) -> FrameOutcome {
        if !self.status.is_analyzing() {
            return FrameOutcome::Skipped(SkipReason::NotAnalyzing);
        }
        let Some(rules) = self.rules.clone() else {
            return FrameOutcome::Skipped(SkipReason::NoRuleSet);
        };
        let (Some(current), Some(initial)) = (current, initial) else {
            return FrameOutcome::Skipped(SkipReason::MissingPose);
        };

        let dt_millis = match self.last_analyzed_at {
            Some(last) => {
                let elapsed = now.millis_since(last);
                if elapsed < self.config.min_frame_interval_ms {
                    tracing::debug!("Dropped frame {}ms after the last analyzed one", elapsed);
                    return FrameOutcome::Skipped(SkipReason::RateLimited);
                }
                elapsed
            }
            None => 0,
        };

        let step = panic::catch_unwind(AssertUnwindSafe(|| {
            self.evaluate(rules.as_ref(), current, initial, dt_millis)
        }));

        match step {
            Ok(step) => self.apply(step, current, now),
            Err(_) => {
                tracing::warn!("Rule set for {} panicked, skipping frame", self.exercise_id);
                FrameOutcome::Skipped(SkipReason::AnalysisFailed)
            }
        }
    }

    /// Run the rule set against the current state without mutating it
    fn evaluate(&self, rules: &dyn ExerciseRules, current: &Pose, initial: &Pose, dt_millis: u64) -> FrameStep {
        let analysis = rules.analyze(
            Some(current),
            Some(initial),
            self.previous_pose.as_ref(),
            dt_millis,
        );

        let mut phase_history = self.phase_history.clone();
        let mut new_phase = None;

        if !analysis.metrics.is_empty() {
            let phase = rules.detect_phase(&analysis.metrics, self.previous_metrics.as_ref());
            if phase != self.phase {
                push_capped(&mut phase_history, phase.clone(), self.config.phase_history_cap);
                new_phase = Some(phase);
            }
        }

        let phases_since_rep = self
            .phases_since_rep
            .map(|n| n + usize::from(new_phase.is_some()));
        let eligible = phases_since_rep.map_or(true, |n| n >= rules.rep_window());

        let current_phase = new_phase.as_ref().unwrap_or(&self.phase);
        let rep_complete = eligible && rules.is_rep_complete(current_phase, phase_history.make_contiguous());

        FrameStep {
            analysis,
            new_phase,
            phase_history,
            rep_complete,
        }
    }

    fn apply(&mut self, step: FrameStep, current: &Pose, now: Timestamp) -> FrameOutcome {
        let FrameStep {
            analysis,
            new_phase,
            phase_history,
            rep_complete,
        } = step;

        self.previous_pose = Some(*current);
        self.last_analyzed_at = Some(now);
        self.status = SessionStatus::Active;

        push_capped(
            &mut self.metrics_history,
            analysis.metrics.clone(),
            self.config.metrics_history_cap,
        );
        self.current_metrics = analysis.metrics.clone();
        if !analysis.metrics.is_empty() {
            self.previous_metrics = Some(analysis.metrics);
        }

        for err in &analysis.errors {
            let already_present = self.errors.iter().any(|e| e.kind == err.kind);
            if !already_present {
                *self.error_counts.entry(err.kind.clone()).or_insert(0) += 1;
            }
        }
        self.feedback = select_feedback(&analysis.errors).cloned();
        self.errors = analysis.errors;

        self.phase_history = phase_history;
        if let Some(phase) = new_phase {
            tracing::debug!("{} phase {} -> {}", self.exercise_id, self.phase, phase);
            self.phase = phase;
            if let Some(n) = self.phases_since_rep.as_mut() {
                *n += 1;
            }
        }

        if rep_complete {
            self.rep_count += 1;
            self.phases_since_rep = Some(0);
            self.errors.clear();
            self.feedback = Some(FormError::rep_completed());

            tracing::info!("{} rep {} completed", self.exercise_id, self.rep_count);
            return FrameOutcome::RepCompleted {
                rep_count: self.rep_count,
            };
        }

        FrameOutcome::Analyzed
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            exercise_phase: self.phase.clone(),
            rep_count: self.rep_count,
            errors: self.errors.clone(),
            feedback: self.feedback.clone(),
            current_metrics: self.current_metrics.clone(),
            is_analyzing: self.is_analyzing(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary_at(Timestamp::now())
    }

    /// Raw counters; a running session reports its elapsed time so far
    pub fn summary_at(&self, now: Timestamp) -> SessionSummary {
        let duration_ms = self.duration_at(now);
        let average_time_per_rep_ms = if self.rep_count > 0 {
            duration_ms as f64 / self.rep_count as f64
        } else {
            0.0
        };

        SessionSummary {
            exercise_id: self.exercise_id.clone(),
            rep_count: self.rep_count,
            duration_ms,
            average_time_per_rep_ms,
            error_counts: self.error_counts.clone(),
            completed: self.rep_count > 0,
        }
    }

    pub fn duration_at(&self, now: Timestamp) -> u64 {
        match (self.status.is_analyzing(), self.started_at) {
            (true, Some(started)) => now.millis_since(started),
            _ => self.duration_ms,
        }
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    pub fn has_rules(&self) -> bool {
        self.rules.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_analyzing(&self) -> bool {
        self.status.is_analyzing()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_history(&self) -> impl ExactSizeIterator<Item = &Phase> {
        self.phase_history.iter()
    }

    pub fn metrics_history(&self) -> impl ExactSizeIterator<Item = &Metrics> {
        self.metrics_history.iter()
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    pub fn feedback(&self) -> Option<&FormError> {
        self.feedback.as_ref()
    }

    pub fn current_metrics(&self) -> &Metrics {
        &self.current_metrics
    }

    pub fn error_counts(&self) -> &BTreeMap<String, u32> {
        &self.error_counts
    }
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("exercise_id", &self.exercise_id)
            .field("status", &self.status)
            .field("phase", &self.phase)
            .field("rep_count", &self.rep_count)
            .finish_non_exhaustive()
    }
}

fn push_capped<T>(queue: &mut VecDeque<T>, item: T, cap: usize) {
    queue.push_back(item);
    while queue.len() > cap {
        queue.pop_front();
    }
}

/// Session handle that serializes access from multiple threads
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<AnalysisSession>>,
}

impl SharedSession {
    pub fn new(session: AnalysisSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn start(&self) {
        self.inner.lock().start();
    }

    pub fn stop(&self) {
        self.inner.lock().stop();
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn submit_frame(&self, current: Option<&Pose>, initial: Option<&Pose>) -> FrameOutcome {
        self.inner.lock().submit_frame(current, initial)
    }

    pub fn submit_frame_at(&self, current: Option<&Pose>, initial: Option<&Pose>, now: Timestamp) -> FrameOutcome {
        self.inner.lock().submit_frame_at(current, initial, now)
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn summary(&self) -> SessionSummary {
        self.inner.lock().summary()
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut AnalysisSession) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
