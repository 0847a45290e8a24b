//! Exercise rule sets and the registry that resolves them by exercise id.

use std::collections::HashMap;
use std::sync::Arc;

use physio_core::{Error, Pose, Result};

use crate::exercises::NeckRotation;
use crate::form::{FormAnalysis, Metrics, Phase};

/// Trailing phase-history window compared against an exercise's cycle
pub const DEFAULT_REP_WINDOW: usize = 5;

/// Capability set every supported exercise provides.
///
/// All three operations are pure: the session owns every piece of mutable
/// state and hands the rule set whatever history it needs.
pub trait ExerciseRules: Send + Sync {
    /// Registry key, e.g. `"neck-rotation"`
    fn exercise_id(&self) -> &str;

    /// Judge form on one frame against the session baseline.
    ///
    /// Must return [`FormAnalysis::incomplete`] when `current` or `initial`
    /// is absent.
    fn analyze(
        &self,
        current: Option<&Pose>,
        initial: Option<&Pose>,
        previous: Option<&Pose>,
        dt_millis: u64,
    ) -> FormAnalysis;

    /// Infer the motion phase from this frame's and the previous frame's metrics
    fn detect_phase(&self, metrics: &Metrics, previous: Option<&Metrics>) -> Phase;

    /// Whether the trailing phase history completes a repetition
    fn is_rep_complete(&self, current_phase: &Phase, phase_history: &[Phase]) -> bool;

    /// Number of trailing phases inspected by [`ExerciseRules::is_rep_complete`]
    fn rep_window(&self) -> usize {
        DEFAULT_REP_WINDOW
    }
}

/// True when the last `window` phases appear, in order and contiguously,
/// anywhere inside `cycle`.
pub fn matches_cycle_window(phase_history: &[Phase], cycle: &[Phase], window: usize) -> bool {
    if window == 0 || phase_history.len() < window || cycle.len() < window {
        return false;
    }

    let trailing = &phase_history[phase_history.len() - window..];
    cycle.windows(window).any(|segment| segment == trailing)
}

/// Lookup table from exercise id to its rule set
#[derive(Clone)]
pub struct ExerciseRegistry {
    rules: HashMap<String, Arc<dyn ExerciseRules>>,
}

impl ExerciseRegistry {
    /// Registry with no exercises
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry with every built-in exercise
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(NeckRotation::default()));
        registry
    }

    /// Add or replace the rule set for its exercise id
    pub fn register(&mut self, rules: Arc<dyn ExerciseRules>) {
        let id = rules.exercise_id().to_string();
        if self.rules.insert(id.clone(), rules).is_some() {
            tracing::debug!("Replaced rule set for exercise {}", id);
        }
    }

    /// Rule set for `exercise_id`, or `None` when nothing is registered
    pub fn get(&self, exercise_id: &str) -> Option<Arc<dyn ExerciseRules>> {
        self.rules.get(exercise_id).cloned()
    }

    /// Rule set for `exercise_id` where one is mandatory
    pub fn require(&self, exercise_id: &str) -> Result<Arc<dyn ExerciseRules>> {
        self.get(exercise_id)
            .ok_or_else(|| Error::UnknownExercise(exercise_id.to_string()))
    }

    pub fn contains(&self, exercise_id: &str) -> bool {
        self.rules.contains_key(exercise_id)
    }

    /// Registered exercise ids, sorted
    pub fn exercise_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ExerciseRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ExerciseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExerciseRegistry")
            .field("exercises", &self.exercise_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::NECK_ROTATION_ID;

    fn phases(tags: &[&'static str]) -> Vec<Phase> {
        tags.iter().copied().map(Phase::from_static).collect()
    }

    #[test]
    fn test_cycle_window_matches_any_offset() {
        let cycle = phases(&["a", "b", "c", "d", "e", "f"]);

        assert!(matches_cycle_window(&phases(&["x", "a", "b", "c"]), &cycle, 3));
        assert!(matches_cycle_window(&phases(&["d", "e", "f"]), &cycle, 3));
        assert!(!matches_cycle_window(&phases(&["a", "c", "d"]), &cycle, 3));
        assert!(!matches_cycle_window(&phases(&["a", "b"]), &cycle, 3));
        assert!(!matches_cycle_window(&phases(&["e", "f", "a"]), &cycle, 3));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ExerciseRegistry::with_builtin();

        assert!(registry.contains(NECK_ROTATION_ID));
        assert!(registry.get(NECK_ROTATION_ID).is_some());
        assert_eq!(registry.exercise_ids(), vec![NECK_ROTATION_ID]);
    }

    #[test]
    fn test_registry_unknown_exercise() {
        let registry = ExerciseRegistry::with_builtin();

        assert!(registry.get("shoulder-roll").is_none());
        match registry.require("shoulder-roll") {
            Err(Error::UnknownExercise(id)) => assert_eq!(id, "shoulder-roll"),
            other => panic!("expected UnknownExercise, got {:?}", other.map(|r| r.exercise_id().to_string())),
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ExerciseRegistry::empty();
        assert!(registry.exercise_ids().is_empty());
        assert!(registry.get(NECK_ROTATION_ID).is_none());
    }
}
