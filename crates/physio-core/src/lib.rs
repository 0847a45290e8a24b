//! # Physio-Core
//!
//! Core types and utilities for the physiotherapy exercise-analysis engine:
//! landmarks and named poses produced from the external pose model, geometry
//! primitives over them, and the shared error type.

pub mod error;
pub mod geometry;
pub mod pose;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use pose::*;
pub use types::*;
