//! Built-in exercise rule sets.

pub mod neck_rotation;

pub use neck_rotation::*;
