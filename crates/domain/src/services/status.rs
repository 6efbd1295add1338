//! Compliance classification.
//!
//! Maps a member's last report and the group's schedule window to a
//! discrete color state and a fixed percentage marker. The rules and
//! their strict comparisons are part of the client contract: dashboards
//! key colors and sort orders off these exact values.

use chrono::NaiveDateTime;

use crate::models::{MemberRole, StatusColor};

/// Classification result: a color state plus its band marker.
///
/// The percentage is one of 0/25/60/80/100 - a band label, not a
/// continuous interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusBand {
    pub color: StatusColor,
    pub percentage_elapsed: Option<f64>,
}

/// Classify one member against the current schedule window.
///
/// The report is judged relative to the *next* boundary (was it an
/// early submission for the upcoming cycle, or a leftover from long
/// ago); once the report falls inside the tolerance window, the live
/// state is judged by how far *now* has progressed toward the next
/// deadline. Equality at any boundary falls through to the later
/// branch.
pub fn classify(
    role: MemberRole,
    last_report_at: Option<NaiveDateTime>,
    previous: Option<NaiveDateTime>,
    next: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> StatusBand {
    // Admins are exempt from compliance tracking.
    if role.is_compliance_exempt() {
        return StatusBand {
            color: StatusColor::DarkGreen,
            percentage_elapsed: Some(0.0),
        };
    }

    let (Some(last_report_at), Some(previous), Some(next)) = (last_report_at, previous, next)
    else {
        return StatusBand {
            color: StatusColor::Grey,
            percentage_elapsed: None,
        };
    };

    let period = next - previous;
    let quarter = period / 4;
    let half = period / 2;

    if last_report_at > next - quarter {
        // Early submission for the upcoming cycle.
        StatusBand {
            color: StatusColor::LightGreen,
            percentage_elapsed: Some(0.0),
        }
    } else if last_report_at < previous - quarter {
        // Stale: the report predates the current cycle's tolerance.
        StatusBand {
            color: StatusColor::LightRed,
            percentage_elapsed: Some(100.0),
        }
    } else if now > next - quarter {
        StatusBand {
            color: StatusColor::LightRed,
            percentage_elapsed: Some(80.0),
        }
    } else if now > next - half {
        StatusBand {
            color: StatusColor::LightYellow,
            percentage_elapsed: Some(60.0),
        }
    } else {
        StatusBand {
            color: StatusColor::LightGreen,
            percentage_elapsed: Some(25.0),
        }
    }
}
