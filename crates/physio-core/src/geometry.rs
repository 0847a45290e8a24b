//! Geometric primitives over image-plane landmarks.
//!
//! Every function accepts possibly-absent points and returns `0.0` (or
//! `false`) instead of failing: pose data is routinely incomplete under
//! occlusion, and callers treat a zero as "nothing measurable".

use nalgebra::Vector2;

use crate::types::Landmark;

/// Below this length a vector has no usable direction
const DEGENERATE_LENGTH: f64 = 1e-10;

/// Default displacement threshold for [`has_moved_significantly`]
pub const SIGNIFICANT_MOVEMENT: f64 = 0.05;

/// Angle at vertex `b` between rays `b→a` and `b→c`, in degrees `[0, 180]`
pub fn angle<'a>(
    a: impl Into<Option<&'a Landmark>>,
    b: impl Into<Option<&'a Landmark>>,
    c: impl Into<Option<&'a Landmark>>,
) -> f64 {
    let (Some(a), Some(b), Some(c)) = (a.into(), b.into(), c.into()) else {
        return 0.0;
    };

    let ba = a.to_vector2() - b.to_vector2();
    let bc = c.to_vector2() - b.to_vector2();
    angle_between(&ba, &bc).to_degrees()
}

/// Euclidean distance in normalized image space
pub fn distance<'a>(a: impl Into<Option<&'a Landmark>>, b: impl Into<Option<&'a Landmark>>) -> f64 {
    match (a.into(), b.into()) {
        (Some(a), Some(b)) => (b.to_vector2() - a.to_vector2()).norm(),
        _ => 0.0,
    }
}

/// Point speed in normalized units per second
pub fn speed<'a>(
    current: impl Into<Option<&'a Landmark>>,
    previous: impl Into<Option<&'a Landmark>>,
    dt_millis: u64,
) -> f64 {
    if dt_millis == 0 {
        return 0.0;
    }
    distance(current, previous) / (dt_millis as f64 / 1000.0)
}

/// Direction of the line `a→b` against the horizontal, in degrees `(-180, 180]`
pub fn line_angle_deg<'a>(a: impl Into<Option<&'a Landmark>>, b: impl Into<Option<&'a Landmark>>) -> f64 {
    match (a.into(), b.into()) {
        (Some(a), Some(b)) => (b.y - a.y).atan2(b.x - a.x).to_degrees(),
        _ => 0.0,
    }
}

/// Whether `current` has drifted more than `threshold` from `initial`
pub fn has_moved_significantly<'a>(
    current: impl Into<Option<&'a Landmark>>,
    initial: impl Into<Option<&'a Landmark>>,
    threshold: f64,
) -> bool {
    match (current.into(), initial.into()) {
        (Some(current), Some(initial)) => distance(current, initial) > threshold,
        _ => false,
    }
}

/// Unsigned angle between two vectors in radians
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let norms = v1.norm() * v2.norm();
    if norms < DEGENERATE_LENGTH || !norms.is_finite() {
        0.0
    } else {
        (v1.dot(v2) / norms).clamp(-1.0, 1.0).acos()
    }
}
