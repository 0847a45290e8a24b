//! Named-point pose built from the pose model's raw landmark array.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::types::{Keypoint, Landmark};

/// One frame's tracked body points, addressed by name.
///
/// Every field is present: a `Pose` only exists when the raw landmark array
/// resolved all 17 tracked points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub nose: Landmark,
    pub left_eye: Landmark,
    pub right_eye: Landmark,
    pub left_ear: Landmark,
    pub right_ear: Landmark,
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_elbow: Landmark,
    pub right_elbow: Landmark,
    pub left_wrist: Landmark,
    pub right_wrist: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
    pub left_knee: Landmark,
    pub right_knee: Landmark,
    pub left_ankle: Landmark,
    pub right_ankle: Landmark,
}

impl Pose {
    /// Map the raw, index-ordered landmark array onto named points.
    ///
    /// Returns `None` ("no pose this frame") when the array is too short to
    /// resolve every tracked index or a tracked landmark is not finite.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.len() < Keypoint::required_landmarks() {
            return None;
        }

        let at = |kp: Keypoint| -> Option<Landmark> {
            let lm = landmarks[kp.model_index()];
            lm.is_finite().then_some(lm)
        };

        Some(Self {
            nose: at(Keypoint::Nose)?,
            left_eye: at(Keypoint::LeftEye)?,
            right_eye: at(Keypoint::RightEye)?,
            left_ear: at(Keypoint::LeftEar)?,
            right_ear: at(Keypoint::RightEar)?,
            left_shoulder: at(Keypoint::LeftShoulder)?,
            right_shoulder: at(Keypoint::RightShoulder)?,
            left_elbow: at(Keypoint::LeftElbow)?,
            right_elbow: at(Keypoint::RightElbow)?,
            left_wrist: at(Keypoint::LeftWrist)?,
            right_wrist: at(Keypoint::RightWrist)?,
            left_hip: at(Keypoint::LeftHip)?,
            right_hip: at(Keypoint::RightHip)?,
            left_knee: at(Keypoint::LeftKnee)?,
            right_knee: at(Keypoint::RightKnee)?,
            left_ankle: at(Keypoint::LeftAnkle)?,
            right_ankle: at(Keypoint::RightAnkle)?,
        })
    }

    pub fn get(&self, keypoint: Keypoint) -> &Landmark {
        match keypoint {
            Keypoint::Nose => &self.nose,
            Keypoint::LeftEye => &self.left_eye,
            Keypoint::RightEye => &self.right_eye,
            Keypoint::LeftEar => &self.left_ear,
            Keypoint::RightEar => &self.right_ear,
            Keypoint::LeftShoulder => &self.left_shoulder,
            Keypoint::RightShoulder => &self.right_shoulder,
            Keypoint::LeftElbow => &self.left_elbow,
            Keypoint::RightElbow => &self.right_elbow,
            Keypoint::LeftWrist => &self.left_wrist,
            Keypoint::RightWrist => &self.right_wrist,
            Keypoint::LeftHip => &self.left_hip,
            Keypoint::RightHip => &self.right_hip,
            Keypoint::LeftKnee => &self.left_knee,
            Keypoint::RightKnee => &self.right_knee,
            Keypoint::LeftAnkle => &self.left_ankle,
            Keypoint::RightAnkle => &self.right_ankle,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Keypoint, &Landmark)> + '_ {
        Keypoint::ALL.into_iter().map(move |kp| (kp, self.get(kp)))
    }

    /// Mean visibility over points that report one
    pub fn mean_visibility(&self) -> Option<f64> {
        let (sum, count) = self
            .iter()
            .filter_map(|(_, lm)| lm.visibility)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

        (count > 0).then(|| sum / count as f64)
    }
}

impl Index<Keypoint> for Pose {
    type Output = Landmark;

    fn index(&self, keypoint: Keypoint) -> &Self::Output {
        self.get(keypoint)
    }
}

/// Pose feature extractor: raw landmark array to named pose
pub fn extract_pose(landmarks: &[Landmark]) -> Option<Pose> {
    if landmarks.is_empty() {
        return None;
    }
    Pose::from_landmarks(landmarks)
}
