//! Fundamental types for the exercise-analysis engine.

use chrono::Utc;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one recorded exercise session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0.simple())
    }
}

/// Wall-clock timestamp with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn as_millis(&self) -> i64 {
        self.0 / 1_000_000
    }

    /// Milliseconds elapsed since `earlier`, clamped at zero
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        let delta = self.0.saturating_sub(earlier.0);
        if delta <= 0 {
            0
        } else {
            (delta / 1_000_000) as u64
        }
    }
}

/// Single body point reported by the pose model.
///
/// Coordinates are normalized to the image (roughly `[0, 1]`), `z` is the
/// model's relative depth and `visibility` its confidence when reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Image-plane position used by all 2D geometry
    pub fn to_vector2(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// The 17 tracked body points, in pose order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Keypoint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Keypoint {
    pub const COUNT: usize = 17;

    pub const ALL: [Keypoint; Keypoint::COUNT] = [
        Keypoint::Nose,
        Keypoint::LeftEye,
        Keypoint::RightEye,
        Keypoint::LeftEar,
        Keypoint::RightEar,
        Keypoint::LeftShoulder,
        Keypoint::RightShoulder,
        Keypoint::LeftElbow,
        Keypoint::RightElbow,
        Keypoint::LeftWrist,
        Keypoint::RightWrist,
        Keypoint::LeftHip,
        Keypoint::RightHip,
        Keypoint::LeftKnee,
        Keypoint::RightKnee,
        Keypoint::LeftAnkle,
        Keypoint::RightAnkle,
    ];

    /// Index of this point in the pose model's 33-landmark output
    pub fn model_index(&self) -> usize {
        match self {
            Keypoint::Nose => 0,
            Keypoint::LeftEye => 1,
            Keypoint::RightEye => 2,
            Keypoint::LeftEar => 3,
            Keypoint::RightEar => 4,
            Keypoint::LeftShoulder => 11,
            Keypoint::RightShoulder => 12,
            Keypoint::LeftElbow => 13,
            Keypoint::RightElbow => 14,
            Keypoint::LeftWrist => 15,
            Keypoint::RightWrist => 16,
            Keypoint::LeftHip => 23,
            Keypoint::RightHip => 24,
            Keypoint::LeftKnee => 25,
            Keypoint::RightKnee => 26,
            Keypoint::LeftAnkle => 27,
            Keypoint::RightAnkle => 28,
        }
    }

    pub fn from_model_index(idx: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|kp| kp.model_index() == idx)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Keypoint::Nose => "nose",
            Keypoint::LeftEye => "leftEye",
            Keypoint::RightEye => "rightEye",
            Keypoint::LeftEar => "leftEar",
            Keypoint::RightEar => "rightEar",
            Keypoint::LeftShoulder => "leftShoulder",
            Keypoint::RightShoulder => "rightShoulder",
            Keypoint::LeftElbow => "leftElbow",
            Keypoint::RightElbow => "rightElbow",
            Keypoint::LeftWrist => "leftWrist",
            Keypoint::RightWrist => "rightWrist",
            Keypoint::LeftHip => "leftHip",
            Keypoint::RightHip => "rightHip",
            Keypoint::LeftKnee => "leftKnee",
            Keypoint::RightKnee => "rightKnee",
            Keypoint::LeftAnkle => "leftAnkle",
            Keypoint::RightAnkle => "rightAnkle",
        }
    }

    /// Minimum landmark array length that resolves every tracked point
    pub fn required_landmarks() -> usize {
        Self::ALL
            .iter()
            .map(|kp| kp.model_index())
            .max()
            .unwrap_or(0)
            + 1
    }
}
