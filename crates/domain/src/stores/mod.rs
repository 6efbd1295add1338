//! Store interfaces consumed by the engine.
//!
//! The engine never talks to a database directly: members, reports,
//! group schedules and urgent responses are reached through these
//! narrow traits. The [`memory`] module provides `Mutex`-backed
//! implementations used by tests and by embedders that do not need
//! durable storage.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::models::{Member, ScheduleConfig, UrgentResponse};

/// Group membership lookups.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// All members of a group whose join request was accepted.
    async fn accepted_members(&self, group_id: Uuid) -> Vec<Member>;

    /// A single membership, in any state.
    async fn find_member(&self, group_id: Uuid, user_id: Uuid) -> Option<Member>;
}

/// Report history lookups.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Instant of the member's most recent report in the group.
    async fn last_report_at(&self, group_id: Uuid, user_id: Uuid) -> Option<DateTime<Utc>>;
}

/// Group-level schedule configuration.
#[async_trait]
pub trait GroupScheduleStore: Send + Sync {
    async fn schedule(&self, group_id: Uuid) -> Option<ScheduleConfig>;

    /// The group's evaluation zone; `None` falls back to the
    /// configured default.
    async fn timezone(&self, group_id: Uuid) -> Option<Tz>;

    async fn group_name(&self, group_id: Uuid) -> Option<String>;

    /// Groups with a non-absent schedule, for reminder enumeration.
    async fn scheduled_group_ids(&self) -> Vec<Uuid>;
}

/// Append-only urgent response rows.
#[async_trait]
pub trait UrgentResponseStore: Send + Sync {
    /// Insert unless a row for this (session, user) pair already
    /// exists. Returns whether the row was inserted; the first writer
    /// wins and later attempts are ignored, never overwritten.
    async fn insert_if_absent(&self, response: UrgentResponse) -> bool;

    /// Number of responses recorded for a session.
    async fn count_for_session(&self, session_id: Uuid) -> usize;

    /// When a member responded to a session, if they did.
    async fn responded_at(&self, session_id: Uuid, user_id: Uuid) -> Option<DateTime<Utc>>;
}
