//! Shared utilities and common types for the Rollcall backend.
//!
//! This crate provides cross-cutting functionality used by the engine:
//! - Injectable wall-clock abstraction for deterministic testing
//! - Time-of-day parsing for schedule marks

pub mod clock;
pub mod timeofday;

pub use clock::{Clock, FixedClock, SystemClock};
pub use timeofday::TimeOfDay;
