//! Domain layer for the Rollcall backend.
//!
//! This crate contains the report scheduling and status engine:
//! - Domain models (schedules, members, statuses, urgent sessions)
//! - Pure schedule/classification/trigger services
//! - The urgent session manager and reminder ticker
//! - Store trait interfaces with in-memory implementations

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod stores;

pub use config::EngineConfig;
pub use error::EngineError;
