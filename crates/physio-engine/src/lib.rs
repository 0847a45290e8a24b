//! # Physio-Engine
//!
//! Per-frame exercise analysis: turns a stream of poses into form errors,
//! motion phases, repetition counts and an end-of-session performance report.
//!
//! ## Pipeline
//!
//! 1. **Tracker** - extract a [`Pose`](physio_core::Pose) from raw landmarks
//!    and hold the session baseline
//! 2. **Rule set** - judge form, classify the motion phase, match the phase
//!    history against the exercise's cycle
//! 3. **Session** - rate-gate frames, keep bounded histories, count reps
//! 4. **Summary** - score the finished session
//!
//! Rule sets are looked up by exercise id in an [`ExerciseRegistry`].

pub mod config;
pub mod exercises;
pub mod form;
pub mod rules;
pub mod session;
pub mod summary;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use config::*;
pub use exercises::*;
pub use form::*;
pub use rules::*;
pub use session::*;
pub use summary::*;
pub use tracker::*;
