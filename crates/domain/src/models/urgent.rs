//! Urgent session models.
//!
//! An urgent session is an ad-hoc, time-boxed collection window opened
//! by a group admin: every accepted non-admin member is expected to
//! submit a report before the deadline. A group has at most one live
//! session at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request payload for opening an urgent session.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateUrgentRequest {
    pub group_id: Uuid,

    #[validate(range(
        min = 5,
        max = 120,
        message = "Deadline must be between 5 and 120 minutes"
    ))]
    pub deadline_minutes: i64,

    #[validate(length(max = 200, message = "Message must be at most 200 characters"))]
    pub message: String,
}

/// One live collection window for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UrgentSession {
    pub session_id: Uuid,
    pub group_id: Uuid,
    pub requested_by: Uuid,
    pub message: String,
    pub requested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UrgentSession {
    /// A session is active until its deadline passes; there is no
    /// other liveness condition.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A member's answer to an urgent session.
///
/// Append-only: one row per (session, member), kept after the session
/// ends for history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UrgentResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub responded_at: DateTime<Utc>,
    pub report_id: Option<Uuid>,
}

/// Aggregate progress of a group's urgent session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UrgentSessionProgress {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by_name: Option<String>,
    /// Accepted non-admin members expected to respond.
    pub total_members: usize,
    pub responded_count: usize,
    pub remaining_seconds: i64,
}

impl UrgentSessionProgress {
    /// The snapshot returned when no session is live.
    pub fn inactive() -> Self {
        Self {
            active: false,
            session_id: None,
            requested_at: None,
            expires_at: None,
            message: None,
            requested_by: None,
            requested_by_name: None,
            total_members: 0,
            responded_count: 0,
            remaining_seconds: 0,
        }
    }
}
