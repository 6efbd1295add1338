//! Derived status models for the group dashboard.
//!
//! Nothing in this module is persisted. A status is recomputed on every
//! query from the group's schedule, each member's last report and the
//! urgent session state, all relative to a single reference instant.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::MemberRole;
use super::urgent::UrgentSessionProgress;

/// Discrete compliance state of a member.
///
/// Each state maps to a fixed dashboard color; the palette is
/// configurable but the states themselves are part of the client
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    /// Admins, always.
    DarkGreen,
    /// Early submission or inside the comfortable part of the cycle.
    LightGreen,
    /// Past the halfway point of the cycle.
    LightYellow,
    /// Critical (deadline imminent) or stale (report long overdue).
    LightRed,
    /// No schedule or no report to classify against.
    Grey,
}

/// Compliance snapshot for one member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberStatus {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: MemberRole,
    pub has_reported: bool,
    /// Last report instant in the group's local time, if any.
    pub last_report_at: Option<NaiveDateTime>,
    pub color: StatusColor,
    /// Hex rendering of `color` for web dashboards.
    pub color_hex: String,
    /// Fixed band marker (0/25/60/80/100), not an interpolation.
    pub percentage_elapsed: Option<f64>,
    pub previous_scheduled: Option<NaiveDateTime>,
    pub next_scheduled: Option<NaiveDateTime>,
    /// When this member answered the active urgent session, if at all.
    pub urgent_responded_at: Option<NaiveDateTime>,
}

/// Full dashboard response for a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupStatuses {
    pub members: Vec<MemberStatus>,
    pub urgent_session: UrgentSessionProgress,
    /// The engine's reference instant in the group's local time, so
    /// clients can render countdowns without trusting their own clock.
    pub server_time: NaiveDateTime,
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_color_serialization() {
        assert_eq!(
            serde_json::to_string(&StatusColor::DarkGreen).unwrap(),
            "\"dark_green\""
        );
        assert_eq!(
            serde_json::to_string(&StatusColor::Grey).unwrap(),
            "\"grey\""
        );
    }
}
