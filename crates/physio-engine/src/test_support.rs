//! Pose fixtures shared by unit tests.

use physio_core::{Keypoint, Landmark, Pose};

/// Upright, facing the camera. Ears are 0.2 apart and 0.2 above their
/// shoulders; both the ear line and the shoulder line are level.
pub fn neutral_pose() -> Pose {
    let mut raw = vec![Landmark::new(0.5, 0.8, 0.0).with_visibility(0.9); 33];

    let mut set = |kp: Keypoint, x: f64, y: f64| {
        raw[kp.model_index()] = Landmark::new(x, y, 0.0).with_visibility(0.95);
    };
    set(Keypoint::Nose, 0.5, 0.3);
    set(Keypoint::LeftEye, 0.53, 0.28);
    set(Keypoint::RightEye, 0.47, 0.28);
    set(Keypoint::LeftEar, 0.6, 0.3);
    set(Keypoint::RightEar, 0.4, 0.3);
    set(Keypoint::LeftShoulder, 0.6, 0.5);
    set(Keypoint::RightShoulder, 0.4, 0.5);

    Pose::from_landmarks(&raw).expect("fixture has every tracked landmark")
}

/// Neutral pose with the nose shifted so the head reads `degrees` of rotation
pub fn neck_pose(degrees: f64) -> Pose {
    let mut pose = neutral_pose();
    pose.nose.x = 0.5 - degrees / 900.0;
    pose
}
