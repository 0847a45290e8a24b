//! Neck rotation: turn the head right, back to center, left, back to center.
//!
//! ## Rotation estimate
//!
//! The head's yaw is estimated from how far the nose sits from each ear,
//! normalized by the ear-to-ear span:
//!
//! θ ≈ (|nose − leftEar| − |nose − rightEar|) / |leftEar − rightEar| · 90
//!
//! Positive angles are rotation to the subject's right.
//!
//! ## Form checks
//!
//! - **Shoulder elevation**: an ear-to-shoulder distance below 85% of the
//!   baseline on either side
//! - **Head tilt**: ear line and shoulder line differ by more than 10°
//! - **Speed**: nose moving faster than 0.5 normalized units per second

use physio_core::{distance, line_angle_deg, speed, Landmark, Pose};
use serde::{Deserialize, Serialize};

use crate::form::{FormAnalysis, FormError, Metrics, Phase, Severity};
use crate::rules::{matches_cycle_window, ExerciseRules, DEFAULT_REP_WINDOW};

pub const NECK_ROTATION_ID: &str = "neck-rotation";

pub const SHOULDER_ELEVATION: &str = "shoulder_elevation";
pub const HEAD_TILT: &str = "head_tilt";
pub const SPEED_TOO_FAST: &str = "speed_too_fast";

pub const ROTATION_ANGLE: &str = "rotationAngle";
pub const DIRECTION: &str = "direction";
pub const MOVEMENT_SPEED: &str = "movementSpeed";
pub const RIGHT_PROGRESS: &str = "rightProgress";
pub const LEFT_PROGRESS: &str = "leftProgress";

/// One full repetition, center to center via both sides
pub const NECK_ROTATION_CYCLE: [Phase; 9] = [
    NeckPhase::CenterPosition.as_phase(),
    NeckPhase::RotatingRight.as_phase(),
    NeckPhase::RightPosition.as_phase(),
    NeckPhase::ReturningFromRight.as_phase(),
    NeckPhase::CenterPosition.as_phase(),
    NeckPhase::RotatingLeft.as_phase(),
    NeckPhase::LeftPosition.as_phase(),
    NeckPhase::ReturningFromLeft.as_phase(),
    NeckPhase::CenterPosition.as_phase(),
];

/// Tuning constants for neck rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeckRotationConfig {
    /// Degrees per unit of normalized nose offset
    pub rotation_scale: f64,
    /// Rotation beyond ±this many degrees leaves "center"
    pub direction_threshold_deg: f64,
    /// Current/baseline ear-to-shoulder ratio below which shoulders count as raised
    pub elevation_ratio: f64,
    /// Maximum ear-line vs shoulder-line difference (degrees)
    pub tilt_threshold_deg: f64,
    /// Maximum nose speed (normalized units per second)
    pub max_nose_speed: f64,
    /// Progress percent per degree of rotation
    pub progress_scale: f64,
    /// Trailing phases matched against the cycle
    pub rep_window: usize,
}

impl Default for NeckRotationConfig {
    fn default() -> Self {
        Self {
            rotation_scale: 90.0,
            direction_threshold_deg: 5.0,
            elevation_ratio: 0.85,
            tilt_threshold_deg: 10.0,
            max_nose_speed: 0.5,
            progress_scale: 2.0,
            rep_window: DEFAULT_REP_WINDOW,
        }
    }
}

/// Which way the head is turned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Center,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Center => "center",
            Direction::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Direction::Left),
            "center" => Some(Direction::Center),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Phase vocabulary for neck rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeckPhase {
    CenterPosition,
    RotatingRight,
    RightPosition,
    ReturningFromRight,
    RotatingLeft,
    LeftPosition,
    ReturningFromLeft,
}

impl NeckPhase {
    pub const fn tag(&self) -> &'static str {
        match self {
            NeckPhase::CenterPosition => "center_position",
            NeckPhase::RotatingRight => "rotating_right",
            NeckPhase::RightPosition => "right_position",
            NeckPhase::ReturningFromRight => "returning_from_right",
            NeckPhase::RotatingLeft => "rotating_left",
            NeckPhase::LeftPosition => "left_position",
            NeckPhase::ReturningFromLeft => "returning_from_left",
        }
    }

    pub const fn as_phase(&self) -> Phase {
        Phase::from_static(self.tag())
    }
}

impl From<NeckPhase> for Phase {
    fn from(phase: NeckPhase) -> Self {
        phase.as_phase()
    }
}

/// Estimated head yaw in degrees; positive is to the right.
///
/// Zero when the ears coincide, since there is no span to normalize by.
pub fn head_rotation_angle(nose: &Landmark, left_ear: &Landmark, right_ear: &Landmark, scale: f64) -> f64 {
    let ear_span = distance(left_ear, right_ear);
    if ear_span < f64::EPSILON {
        return 0.0;
    }

    let offset = distance(nose, left_ear) - distance(nose, right_ear);
    offset / ear_span * scale
}

/// Step classification of a rotation angle; the threshold itself is center
pub fn classify_direction(rotation_angle: f64, threshold_deg: f64) -> Direction {
    if rotation_angle > threshold_deg {
        Direction::Right
    } else if rotation_angle < -threshold_deg {
        Direction::Left
    } else {
        Direction::Center
    }
}

/// Smallest absolute difference between two line directions, in degrees
fn line_angle_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = (a_deg - b_deg).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Increasing,
    Decreasing,
    Holding,
}

/// Neck rotation rule set
#[derive(Debug, Clone, Default)]
pub struct NeckRotation {
    config: NeckRotationConfig,
}

impl NeckRotation {
    pub fn new(config: NeckRotationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NeckRotationConfig {
        &self.config
    }

    pub fn rotation_angle(&self, pose: &Pose) -> f64 {
        head_rotation_angle(
            &pose.nose,
            &pose.left_ear,
            &pose.right_ear,
            self.config.rotation_scale,
        )
    }

    /// Either ear has dropped toward its shoulder relative to the baseline
    pub fn shoulders_elevated(&self, current: &Pose, initial: &Pose) -> bool {
        let side = |ear: &Landmark, shoulder: &Landmark, ear0: &Landmark, shoulder0: &Landmark| {
            let baseline = distance(ear0, shoulder0);
            baseline > f64::EPSILON && distance(ear, shoulder) / baseline < self.config.elevation_ratio
        };

        side(
            &current.left_ear,
            &current.left_shoulder,
            &initial.left_ear,
            &initial.left_shoulder,
        ) || side(
            &current.right_ear,
            &current.right_shoulder,
            &initial.right_ear,
            &initial.right_shoulder,
        )
    }

    /// Ear line is not parallel to the shoulder line
    pub fn head_tilted(&self, pose: &Pose) -> bool {
        let ear_line = line_angle_deg(&pose.left_ear, &pose.right_ear);
        let shoulder_line = line_angle_deg(&pose.left_shoulder, &pose.right_shoulder);
        line_angle_difference(ear_line, shoulder_line) > self.config.tilt_threshold_deg
    }
}

impl ExerciseRules for NeckRotation {
    fn exercise_id(&self) -> &str {
        NECK_ROTATION_ID
    }

    fn analyze(
        &self,
        current: Option<&Pose>,
        initial: Option<&Pose>,
        previous: Option<&Pose>,
        dt_millis: u64,
    ) -> FormAnalysis {
        let (Some(current), Some(initial)) = (current, initial) else {
            return FormAnalysis::incomplete();
        };

        let mut errors = Vec::new();
        let mut metrics = Metrics::new();

        let rotation = self.rotation_angle(current);
        let direction = classify_direction(rotation, self.config.direction_threshold_deg);
        metrics.insert(ROTATION_ANGLE, rotation);
        metrics.insert(DIRECTION, direction.as_str());

        if self.shoulders_elevated(current, initial) {
            errors.push(FormError::new(
                SHOULDER_ELEVATION,
                "Keep your shoulders relaxed and down",
                Severity::Medium,
            ));
        }

        if self.head_tilted(current) {
            errors.push(FormError::new(
                HEAD_TILT,
                "Keep your head level, rotate horizontally only",
                Severity::High,
            ));
        }

        if let Some(previous) = previous.filter(|_| dt_millis > 0) {
            let nose_speed = speed(&current.nose, &previous.nose, dt_millis);
            metrics.insert(MOVEMENT_SPEED, nose_speed);

            if nose_speed > self.config.max_nose_speed {
                errors.push(FormError::new(
                    SPEED_TOO_FAST,
                    "Slow down, move more gradually",
                    Severity::Medium,
                ));
            }
        }

        let progress = (rotation.abs() * self.config.progress_scale).min(100.0);
        match direction {
            Direction::Right => metrics.insert(RIGHT_PROGRESS, progress),
            Direction::Left => metrics.insert(LEFT_PROGRESS, progress),
            Direction::Center => {}
        }

        FormAnalysis::from_parts(errors, metrics)
    }

    fn detect_phase(&self, metrics: &Metrics, previous: Option<&Metrics>) -> Phase {
        let Some(direction) = metrics.category(DIRECTION).and_then(Direction::parse) else {
            return Phase::UNKNOWN;
        };

        let trend = match (
            metrics.number(ROTATION_ANGLE),
            previous.and_then(|m| m.number(ROTATION_ANGLE)),
        ) {
            (Some(now), Some(before)) if now > before => Trend::Increasing,
            (Some(now), Some(before)) if now < before => Trend::Decreasing,
            _ => Trend::Holding,
        };

        let phase = match (direction, trend) {
            (Direction::Center, _) => NeckPhase::CenterPosition,
            (Direction::Right, Trend::Increasing) => NeckPhase::RotatingRight,
            (Direction::Right, Trend::Decreasing) => NeckPhase::ReturningFromRight,
            (Direction::Right, Trend::Holding) => NeckPhase::RightPosition,
            (Direction::Left, Trend::Decreasing) => NeckPhase::RotatingLeft,
            (Direction::Left, Trend::Increasing) => NeckPhase::ReturningFromLeft,
            (Direction::Left, Trend::Holding) => NeckPhase::LeftPosition,
        };

        phase.as_phase()
    }

    fn is_rep_complete(&self, _current_phase: &Phase, phase_history: &[Phase]) -> bool {
        matches_cycle_window(phase_history, &NECK_ROTATION_CYCLE, self.config.rep_window)
    }

    fn rep_window(&self) -> usize {
        self.config.rep_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{neck_pose, neutral_pose};

    fn rules() -> NeckRotation {
        NeckRotation::default()
    }

    fn metrics_for(rotation: f64) -> Metrics {
        let mut metrics = Metrics::new();
        metrics.insert(ROTATION_ANGLE, rotation);
        metrics.insert(DIRECTION, classify_direction(rotation, 5.0).as_str());
        metrics
    }

    #[test]
    fn test_missing_baseline_is_incomplete() {
        let pose = neutral_pose();
        let analysis = rules().analyze(Some(&pose), None, None, 100);

        assert!(!analysis.is_valid);
        assert!(analysis.errors.is_empty());
        assert!(analysis.metrics.is_empty());

        let analysis = rules().analyze(None, Some(&pose), Some(&pose), 100);
        assert_eq!(analysis, FormAnalysis::incomplete());
    }

    #[test]
    fn test_neutral_pose_is_valid_center() {
        let pose = neutral_pose();
        let analysis = rules().analyze(Some(&pose), Some(&pose), None, 0);

        assert!(analysis.is_valid);
        assert_eq!(analysis.metrics.category(DIRECTION), Some("center"));
        assert!(analysis.metrics.number(ROTATION_ANGLE).unwrap().abs() < 1e-9);
        assert!(analysis.metrics.number(MOVEMENT_SPEED).is_none());
    }

    #[test]
    fn test_rotation_classification() {
        let initial = neutral_pose();
        let direction_at = |deg: f64| {
            let pose = neck_pose(deg);
            rules()
                .analyze(Some(&pose), Some(&initial), None, 0)
                .metrics
                .category(DIRECTION)
                .map(str::to_string)
        };

        assert_eq!(direction_at(6.0).as_deref(), Some("right"));
        assert_eq!(direction_at(-6.0).as_deref(), Some("left"));
        assert_eq!(direction_at(0.0).as_deref(), Some("center"));
    }

    #[test]
    fn test_direction_threshold_is_exclusive() {
        assert_eq!(classify_direction(5.0, 5.0), Direction::Center);
        assert_eq!(classify_direction(-5.0, 5.0), Direction::Center);
        assert_eq!(classify_direction(5.0001, 5.0), Direction::Right);
        assert_eq!(classify_direction(-5.0001, 5.0), Direction::Left);
    }

    #[test]
    fn test_rotation_angle_estimate() {
        let rotation = rules().rotation_angle(&neck_pose(20.0));
        assert!((rotation - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_ears_yield_zero_rotation() {
        let ear = Landmark::new(0.5, 0.3, 0.0);
        let nose = Landmark::new(0.45, 0.3, 0.0);
        assert_eq!(head_rotation_angle(&nose, &ear, &ear, 90.0), 0.0);
    }

    #[test]
    fn test_progress_metrics() {
        let initial = neutral_pose();
        let pose = neck_pose(30.0);
        let metrics = rules().analyze(Some(&pose), Some(&initial), None, 0).metrics;
        assert!((metrics.number(RIGHT_PROGRESS).unwrap() - 60.0).abs() < 1e-6);
        assert!(metrics.number(LEFT_PROGRESS).is_none());

        let pose = neck_pose(-70.0);
        let metrics = rules().analyze(Some(&pose), Some(&initial), None, 0).metrics;
        assert_eq!(metrics.number(LEFT_PROGRESS), Some(100.0));
    }

    #[test]
    fn test_shoulder_elevation_detected() {
        let initial = neutral_pose();
        let mut raised = neutral_pose();
        // Ear-to-shoulder baseline is 0.2; 0.16 is a ratio of 0.8. Both sides
        // are raised so the shoulder line stays level.
        raised.left_shoulder.y = raised.left_ear.y + 0.16;
        raised.right_shoulder.y = raised.right_ear.y + 0.16;

        let analysis = rules().analyze(Some(&raised), Some(&initial), None, 0);
        assert!(!analysis.is_valid);
        assert_eq!(analysis.errors.len(), 1);
        assert_eq!(analysis.errors[0].kind, SHOULDER_ELEVATION);
        assert_eq!(analysis.errors[0].severity, Severity::Medium);
    }

    #[test]
    fn test_head_tilt_detected() {
        let initial = neutral_pose();
        let mut tilted = neutral_pose();
        tilted.right_ear.y += 0.05;
        tilted.left_ear.y -= 0.05;

        let analysis = rules().analyze(Some(&tilted), Some(&initial), None, 0);
        let kinds: Vec<&str> = analysis.errors.iter().map(|e| e.kind.as_str()).collect();
        assert!(kinds.contains(&HEAD_TILT));
        assert_eq!(
            analysis.errors.iter().find(|e| e.kind == HEAD_TILT).unwrap().severity,
            Severity::High
        );
    }

    #[test]
    fn test_mirrored_lines_are_not_tilt() {
        // Both lines point left-to-right across the ±180° seam
        assert!(line_angle_difference(179.0, -179.0) < 10.0);
        assert!((line_angle_difference(10.0, -5.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_too_fast() {
        let initial = neutral_pose();
        let previous = neck_pose(0.0);
        let mut current = neck_pose(0.0);
        current.nose.y += 0.08; // 0.08 units in 100ms = 0.8 u/s

        let analysis = rules().analyze(Some(&current), Some(&initial), Some(&previous), 100);
        assert!(analysis.errors.iter().any(|e| e.kind == SPEED_TOO_FAST));
        assert!((analysis.metrics.number(MOVEMENT_SPEED).unwrap() - 0.8).abs() < 1e-9);

        let slow = rules().analyze(Some(&neck_pose(1.0)), Some(&initial), Some(&previous), 100);
        assert!(slow.errors.is_empty());
    }

    #[test]
    fn test_phase_detection() {
        let r = rules();

        assert_eq!(r.detect_phase(&metrics_for(0.0), None), NeckPhase::CenterPosition.as_phase());
        assert_eq!(r.detect_phase(&metrics_for(10.0), None), NeckPhase::RightPosition.as_phase());
        assert_eq!(
            r.detect_phase(&metrics_for(12.0), Some(&metrics_for(10.0))),
            NeckPhase::RotatingRight.as_phase()
        );
        assert_eq!(
            r.detect_phase(&metrics_for(8.0), Some(&metrics_for(10.0))),
            NeckPhase::ReturningFromRight.as_phase()
        );
        assert_eq!(
            r.detect_phase(&metrics_for(-12.0), Some(&metrics_for(-10.0))),
            NeckPhase::RotatingLeft.as_phase()
        );
        assert_eq!(
            r.detect_phase(&metrics_for(-8.0), Some(&metrics_for(-10.0))),
            NeckPhase::ReturningFromLeft.as_phase()
        );
        assert_eq!(
            r.detect_phase(&metrics_for(-8.0), Some(&metrics_for(-8.0))),
            NeckPhase::LeftPosition.as_phase()
        );
        assert_eq!(r.detect_phase(&Metrics::new(), None), Phase::UNKNOWN);
    }

    #[test]
    fn test_rep_complete_on_cycle_segments() {
        let r = rules();
        let history: Vec<Phase> = std::iter::once(Phase::NOT_STARTED)
            .chain(NECK_ROTATION_CYCLE[..5].iter().cloned())
            .collect();
        let current = history.last().unwrap().clone();
        assert!(r.is_rep_complete(&current, &history));

        let tail = NECK_ROTATION_CYCLE[4..].to_vec();
        assert!(r.is_rep_complete(&tail[4], &tail));

        let short = NECK_ROTATION_CYCLE[..4].to_vec();
        assert!(!r.is_rep_complete(&short[3], &short));

        let scrambled = vec![
            NeckPhase::CenterPosition.as_phase(),
            NeckPhase::RotatingLeft.as_phase(),
            NeckPhase::RightPosition.as_phase(),
            NeckPhase::ReturningFromRight.as_phase(),
            NeckPhase::CenterPosition.as_phase(),
        ];
        assert!(!r.is_rep_complete(&scrambled[4], &scrambled));
    }
}
