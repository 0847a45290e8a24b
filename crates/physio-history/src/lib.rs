//! # Physio-History
//!
//! Log of finished exercise sessions: append-only per exercise, ordered by
//! the time each session was recorded. Answers best-performance and
//! progress-trend queries and round-trips through a JSON snapshot that a
//! persistence layer can store however it likes.

pub mod history;

pub use history::*;
