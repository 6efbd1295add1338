//! Domain models for the Rollcall engine.

pub mod member;
pub mod schedule;
pub mod status;
pub mod urgent;

pub use member::{Member, MemberRole, MemberState};
pub use schedule::ScheduleConfig;
pub use status::{GroupStatuses, MemberStatus, StatusColor};
pub use urgent::{CreateUrgentRequest, UrgentResponse, UrgentSession, UrgentSessionProgress};
