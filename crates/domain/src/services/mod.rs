//! Engine services.
//!
//! The pure layers (schedule arithmetic, classification, trigger
//! detection) are plain functions; the stateful layers (urgent
//! sessions, reminders, background jobs) are services composed by
//! [`engine::StatusEngine`].

pub mod engine;
pub mod jobs;
pub mod notification;
pub mod reminder;
pub mod schedule;
pub mod status;
pub mod trigger;
pub mod urgent;

pub use engine::StatusEngine;
pub use jobs::{Job, JobFrequency, JobScheduler};
pub use notification::{MockNotificationGateway, NotificationGateway, SentBatch};
pub use reminder::{ReminderJob, ReminderService};
pub use urgent::{UrgentSessionManager, UrgentSweepJob};
