//! Drives a neck-rotation session end to end through the public API.

use physio_core::{Keypoint, Landmark, Timestamp};
use physio_engine::{
    AnalysisSession, EngineConfig, ExerciseRegistry, FrameOutcome, PerformanceLevel, PerformanceSummary,
    PoseTracker, SkipReason, HEAD_TILT, NECK_ROTATION_ID,
};

/// Raw model output with the head turned `degrees` to the right and the ears
/// offset vertically by `tilt` in opposite directions
fn frame(degrees: f64, tilt: f64) -> Vec<Landmark> {
    let mut raw = vec![Landmark::new(0.5, 0.8, 0.0).with_visibility(0.9); 33];
    let points = [
        (Keypoint::Nose, 0.5 - degrees / 900.0, 0.3),
        (Keypoint::LeftEye, 0.53, 0.28),
        (Keypoint::RightEye, 0.47, 0.28),
        (Keypoint::LeftEar, 0.6, 0.3 - tilt),
        (Keypoint::RightEar, 0.4, 0.3 + tilt),
        (Keypoint::LeftShoulder, 0.6, 0.5),
        (Keypoint::RightShoulder, 0.4, 0.5),
    ];
    for (kp, x, y) in points {
        raw[kp.model_index()] = Landmark::new(x, y, 0.0).with_visibility(0.95);
    }
    raw
}

struct Driver {
    tracker: PoseTracker,
    session: AnalysisSession,
    clock: i64,
}

impl Driver {
    fn new() -> Self {
        let registry = ExerciseRegistry::default();
        let session = AnalysisSession::for_exercise(NECK_ROTATION_ID, &registry, EngineConfig::default())
            .expect("neck rotation is built in");

        Self {
            tracker: PoseTracker::new(),
            session,
            clock: 0,
        }
    }

    /// Submit a raw frame `after_ms` after the previous one
    fn push(&mut self, raw: &[Landmark], after_ms: i64) -> FrameOutcome {
        self.clock += after_ms;
        let now = Timestamp::from_millis(self.clock);
        match self.tracker.observe(raw) {
            Some((current, initial)) => self.session.submit_frame_at(Some(&current), Some(&initial), now),
            None => self.session.submit_frame_at(None, self.tracker.initial(), now),
        }
    }
}

#[test]
fn test_neck_rotation_session() {
    let mut driver = Driver::new();
    driver.session.start_at(Timestamp::from_millis(0));

    let first_cycle = [0.0, 10.0, 10.0, 6.0, 0.0, -10.0, -10.0, -6.0, 0.0];
    let mut reps_seen = Vec::new();
    for deg in first_cycle {
        if let FrameOutcome::RepCompleted { rep_count } = driver.push(&frame(deg, 0.0), 100) {
            reps_seen.push(rep_count);
        }
    }
    assert_eq!(reps_seen, vec![1]);

    // Pose-detection dropout and an over-eager camera are both tolerated
    assert_eq!(
        driver.push(&[], 100),
        FrameOutcome::Skipped(SkipReason::MissingPose)
    );
    assert_eq!(
        driver.push(&frame(0.0, 0.0), 0),
        FrameOutcome::Analyzed
    );
    assert_eq!(
        driver.push(&frame(0.0, 0.0), 30),
        FrameOutcome::Skipped(SkipReason::RateLimited)
    );

    for deg in [10.0, 10.0, 6.0, 0.0] {
        driver.push(&frame(deg, 0.0), 100);
    }
    assert_eq!(driver.session.rep_count(), 2);

    // A tilted head while holding center
    driver.push(&frame(0.0, 0.025), 100);
    let snapshot = driver.session.snapshot();
    assert_eq!(snapshot.feedback.as_ref().map(|f| f.kind.as_str()), Some(HEAD_TILT));
    assert_eq!(snapshot.rep_count, 2);

    driver.session.stop_at(Timestamp::from_millis(30_000));
    assert!(!driver.session.is_analyzing());
    assert_eq!(driver.push(&frame(0.0, 0.0), 100), FrameOutcome::Skipped(SkipReason::NotAnalyzing));

    let counters = driver.session.summary_at(Timestamp::from_millis(40_000));
    assert_eq!(counters.rep_count, 2);
    assert_eq!(counters.duration_ms, 30_000);
    assert_eq!(counters.error_counts.get(HEAD_TILT), Some(&1));

    let report = PerformanceSummary::from_session(&counters);
    // 100 - (1 × 1.5 / 2) × 10 = 92.5, rounded up
    assert_eq!(report.form_score, 93);
    assert_eq!(report.performance_level, PerformanceLevel::Excellent);
    assert_eq!(report.duration, 30.0);
    assert_eq!(report.average_time_per_rep, 15.0);
    assert_eq!(report.error_frequency.get(HEAD_TILT), Some(&50));
    assert_eq!(report.improvement_suggestions.len(), 2);
    assert!(report.message().starts_with("Great job! You completed 2 repetitions"));
}

#[test]
fn test_unknown_exercise_is_reported() {
    let registry = ExerciseRegistry::default();
    assert!(AnalysisSession::for_exercise("jumping-jacks", &registry, EngineConfig::default()).is_err());

    let mut session = AnalysisSession::new("jumping-jacks", &registry, EngineConfig::default());
    session.start_at(Timestamp::from_millis(0));
    let mut tracker = PoseTracker::new();
    let (current, initial) = tracker.observe(&frame(0.0, 0.0)).unwrap();

    assert_eq!(
        session.submit_frame_at(Some(&current), Some(&initial), Timestamp::from_millis(0)),
        FrameOutcome::Skipped(SkipReason::NoRuleSet)
    );
    assert_eq!(session.summary_at(Timestamp::from_millis(1_000)).rep_count, 0);
}
