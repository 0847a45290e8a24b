//! Per-session pose tracking with baseline capture.

use physio_core::{extract_pose, has_moved_significantly, Keypoint, Landmark, Pose};

/// Latest pose plus the baseline pose every frame is judged against.
///
/// The first valid pose observed becomes the baseline. Each tracker is
/// independent, so concurrent sessions never share a baseline.
#[derive(Debug, Clone, Default)]
pub struct PoseTracker {
    latest: Option<Pose>,
    initial: Option<Pose>,
    frames_observed: u64,
}

impl PoseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract this frame's pose and return `(current, initial)`.
    ///
    /// A frame without a usable pose clears `latest` and returns `None`; the
    /// baseline is kept.
    pub fn observe(&mut self, landmarks: &[Landmark]) -> Option<(Pose, Pose)> {
        self.frames_observed += 1;

        let Some(pose) = extract_pose(landmarks) else {
            self.latest = None;
            return None;
        };

        let initial = *self.initial.get_or_insert_with(|| {
            tracing::debug!("Captured baseline pose");
            pose
        });
        self.latest = Some(pose);

        Some((pose, initial))
    }

    /// Replace the baseline with the latest observed pose; false if there is none
    pub fn reset_baseline(&mut self) -> bool {
        match self.latest {
            Some(pose) => {
                self.initial = Some(pose);
                true
            }
            None => false,
        }
    }

    /// Forget both poses so the next valid frame becomes the baseline
    pub fn clear(&mut self) {
        self.latest = None;
        self.initial = None;
        self.frames_observed = 0;
    }

    pub fn latest(&self) -> Option<&Pose> {
        self.latest.as_ref()
    }

    pub fn initial(&self) -> Option<&Pose> {
        self.initial.as_ref()
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    /// Whether `keypoint` has drifted more than `threshold` from the baseline
    pub fn has_moved(&self, keypoint: Keypoint, threshold: f64) -> bool {
        match (self.latest.as_ref(), self.initial.as_ref()) {
            (Some(latest), Some(initial)) => {
                has_moved_significantly(latest.get(keypoint), initial.get(keypoint), threshold)
            }
            _ => false,
        }
    }
}
