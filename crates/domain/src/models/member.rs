//! Group membership models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Moderator,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Moderator => "moderator",
            MemberRole::Member => "member",
        }
    }

    /// Returns true if this role can create and end urgent sessions
    /// and view other members' report data.
    pub fn has_admin_rights(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Moderator)
    }

    /// Returns true if this role is exempt from compliance tracking.
    ///
    /// Only full admins are exempt; moderators report like everyone
    /// else.
    pub fn is_compliance_exempt(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(MemberRole::Admin),
            "moderator" => Ok(MemberRole::Moderator),
            "member" => Ok(MemberRole::Member),
            _ => Err(format!("Invalid member role: {}", s)),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Join-request state of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberState {
    Accepted,
    Pending,
    Rejected,
}

/// A user's membership in a group, with delivery preferences.
///
/// `device_token` is the native push channel; `web_token` is the web
/// channel used by browser clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Member {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: MemberRole,
    pub state: MemberState,
    pub notifications_enabled: bool,
    pub device_token: Option<String>,
    pub web_token: Option<String>,
}

impl Member {
    pub fn is_accepted(&self) -> bool {
        self.state == MemberState::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Admin.as_str(), "admin");
        assert_eq!(MemberRole::Moderator.as_str(), "moderator");
        assert_eq!(MemberRole::Member.as_str(), "member");
    }

    #[test]
    fn test_member_role_from_str() {
        assert_eq!(MemberRole::from_str("admin").unwrap(), MemberRole::Admin);
        assert_eq!(
            MemberRole::from_str("MODERATOR").unwrap(),
            MemberRole::Moderator
        );
        assert_eq!(MemberRole::from_str("Member").unwrap(), MemberRole::Member);
        assert!(MemberRole::from_str("owner").is_err());
    }

    #[test]
    fn test_admin_rights() {
        assert!(MemberRole::Admin.has_admin_rights());
        assert!(MemberRole::Moderator.has_admin_rights());
        assert!(!MemberRole::Member.has_admin_rights());
    }

    #[test]
    fn test_compliance_exemption_is_admin_only() {
        assert!(MemberRole::Admin.is_compliance_exempt());
        assert!(!MemberRole::Moderator.is_compliance_exempt());
        assert!(!MemberRole::Member.is_compliance_exempt());
    }

    #[test]
    fn test_member_state_serialization() {
        let json = serde_json::to_string(&MemberState::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
