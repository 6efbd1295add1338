//! Urgent session management.
//!
//! One live collection window per group, enforced atomically: the
//! session slot is checked and written under a single lock, so of two
//! concurrent creators exactly one wins and the other sees
//! `AlreadyActive`. Response recording leans on the response store's
//! uniqueness guarantee instead of a lock, so racing submissions from
//! the same member resolve to one row without blocking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::EngineError;
use crate::models::{CreateUrgentRequest, UrgentResponse, UrgentSession, UrgentSessionProgress};
use crate::stores::{MemberStore, UrgentResponseStore};

use super::jobs::{Job, JobFrequency};

pub struct UrgentSessionManager {
    sessions: Mutex<HashMap<Uuid, UrgentSession>>,
    members: Arc<dyn MemberStore>,
    responses: Arc<dyn UrgentResponseStore>,
}

impl UrgentSessionManager {
    pub fn new(members: Arc<dyn MemberStore>, responses: Arc<dyn UrgentResponseStore>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            members,
            responses,
        }
    }

    /// Open a collection window for a group.
    ///
    /// Fails with `AlreadyActive` while a previous window is still
    /// live. A leftover expired session is overwritten. The requester
    /// must be an accepted member with admin rights.
    pub async fn create(
        &self,
        request: &CreateUrgentRequest,
        requested_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<UrgentSession, EngineError> {
        request.validate()?;
        self.require_admin(request.group_id, requested_by).await?;

        let session = UrgentSession {
            session_id: Uuid::new_v4(),
            group_id: request.group_id,
            requested_by,
            message: request.message.clone(),
            requested_at: now,
            expires_at: now + chrono::Duration::minutes(request.deadline_minutes),
        };

        // Check-and-set under one lock: a concurrent creator that got
        // here first wins and this call fails closed.
        {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(existing) = sessions.get(&request.group_id) {
                if existing.is_active(now) {
                    return Err(EngineError::AlreadyActive);
                }
            }
            sessions.insert(request.group_id, session.clone());
        }

        info!(
            session_id = %session.session_id,
            group_id = %session.group_id,
            deadline_minutes = request.deadline_minutes,
            "Urgent session created"
        );
        Ok(session)
    }

    /// The group's session, if one is live at `now`.
    pub fn active_session(&self, group_id: Uuid, now: DateTime<Utc>) -> Option<UrgentSession> {
        self.sessions
            .lock()
            .unwrap()
            .get(&group_id)
            .filter(|session| session.is_active(now))
            .cloned()
    }

    pub fn is_active(&self, group_id: Uuid, now: DateTime<Utc>) -> bool {
        self.active_session(group_id, now).is_some()
    }

    /// Record a member's response to the live session, if any.
    ///
    /// Silently does nothing when no session is live, the member is
    /// unknown or not accepted, the member is an exempt admin, or a
    /// response for this (session, member) pair already exists.
    /// Returns whether a row was recorded.
    pub async fn record_response_if_active(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        report_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(session) = self.active_session(group_id, now) else {
            return false;
        };

        let Some(member) = self.members.find_member(group_id, user_id).await else {
            return false;
        };
        if !member.is_accepted() || member.role.is_compliance_exempt() {
            return false;
        }

        let inserted = self
            .responses
            .insert_if_absent(UrgentResponse {
                id: Uuid::new_v4(),
                session_id: session.session_id,
                group_id,
                user_id,
                responded_at: now,
                report_id,
            })
            .await;

        if inserted {
            info!(
                session_id = %session.session_id,
                user_id = %user_id,
                "Urgent response recorded"
            );
        }
        inserted
    }

    /// When the member answered the live session, if they did.
    pub async fn responded_at(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let session = self.active_session(group_id, now)?;
        self.responses
            .responded_at(session.session_id, user_id)
            .await
    }

    /// Close the group's session explicitly.
    ///
    /// Clears the session slot (a leftover expired slot counts) while
    /// keeping every recorded response row for history.
    pub async fn end(&self, group_id: Uuid, requested_by: Uuid) -> Result<(), EngineError> {
        self.require_admin(group_id, requested_by).await?;

        let removed = self.sessions.lock().unwrap().remove(&group_id);
        match removed {
            Some(session) => {
                info!(
                    session_id = %session.session_id,
                    group_id = %group_id,
                    "Urgent session ended"
                );
                Ok(())
            }
            None => Err(EngineError::NotFound(
                "No urgent session to end for this group".to_string(),
            )),
        }
    }

    /// Aggregate progress snapshot of the group's session.
    pub async fn progress(&self, group_id: Uuid, now: DateTime<Utc>) -> UrgentSessionProgress {
        let Some(session) = self.active_session(group_id, now) else {
            return UrgentSessionProgress::inactive();
        };

        let members = self.members.accepted_members(group_id).await;
        let total_members = members
            .iter()
            .filter(|m| !m.role.is_compliance_exempt())
            .count();
        let responded_count = self.responses.count_for_session(session.session_id).await;
        let remaining_seconds = (session.expires_at - now).num_seconds().max(0);
        let requested_by_name = self
            .members
            .find_member(group_id, session.requested_by)
            .await
            .map(|m| m.display_name);

        UrgentSessionProgress {
            active: true,
            session_id: Some(session.session_id),
            requested_at: Some(session.requested_at),
            expires_at: Some(session.expires_at),
            message: Some(session.message),
            requested_by: Some(session.requested_by),
            requested_by_name,
            total_members,
            responded_count,
            remaining_seconds,
        }
    }

    /// Clear session slots whose deadline has fully passed.
    ///
    /// Idempotent maintenance pass, kept off the request path. Response
    /// rows are untouched.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| session.is_active(now));
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept, "Swept expired urgent sessions");
        }
        swept
    }

    async fn require_admin(&self, group_id: Uuid, user_id: Uuid) -> Result<(), EngineError> {
        let member = self
            .members
            .find_member(group_id, user_id)
            .await
            .ok_or_else(|| {
                EngineError::NotAuthorized("You are not a member of this group".to_string())
            })?;
        if !member.is_accepted() {
            return Err(EngineError::NotAuthorized(
                "Your membership is not accepted yet".to_string(),
            ));
        }
        if !member.role.has_admin_rights() {
            return Err(EngineError::NotAuthorized(
                "Only an admin or moderator can manage urgent sessions".to_string(),
            ));
        }
        Ok(())
    }
}

/// Background job clearing fully-expired session slots.
pub struct UrgentSweepJob {
    manager: Arc<UrgentSessionManager>,
    clock: Arc<dyn shared::Clock>,
    interval_minutes: u64,
}

impl UrgentSweepJob {
    pub fn new(
        manager: Arc<UrgentSessionManager>,
        clock: Arc<dyn shared::Clock>,
        interval_minutes: u64,
    ) -> Self {
        Self {
            manager,
            clock,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for UrgentSweepJob {
    fn name(&self) -> &'static str {
        "urgent_session_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let swept = self.manager.sweep_expired(self.clock.now_utc());
        if swept > 0 {
            info!(swept, "Cleared expired urgent sessions");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::models::{Member, MemberRole, MemberState};
    use crate::stores::memory::{InMemoryMemberStore, InMemoryUrgentResponseStore};

    fn member(user_id: Uuid, role: MemberRole, state: MemberState) -> Member {
        Member {
            user_id,
            display_name: format!("user-{}", &user_id.to_string()[..8]),
            role,
            state,
            notifications_enabled: true,
            device_token: None,
            web_token: None,
        }
    }

    struct Fixture {
        manager: UrgentSessionManager,
        responses: Arc<InMemoryUrgentResponseStore>,
        group_id: Uuid,
        admin_id: Uuid,
        member_id: Uuid,
    }

    fn fixture() -> Fixture {
        let members = Arc::new(InMemoryMemberStore::new());
        let responses = Arc::new(InMemoryUrgentResponseStore::new());
        let group_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();

        members.upsert(
            group_id,
            member(admin_id, MemberRole::Admin, MemberState::Accepted),
        );
        members.upsert(
            group_id,
            member(member_id, MemberRole::Member, MemberState::Accepted),
        );

        Fixture {
            manager: UrgentSessionManager::new(members, Arc::clone(&responses) as _),
            responses,
            group_id,
            admin_id,
            member_id,
        }
    }

    fn request(group_id: Uuid, deadline_minutes: i64) -> CreateUrgentRequest {
        CreateUrgentRequest {
            group_id,
            deadline_minutes,
            message: "report in now".to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_conflict_then_expiry() {
        let f = fixture();
        let now = t0();

        let session = f
            .manager
            .create(&request(f.group_id, 30), f.admin_id, now)
            .await
            .unwrap();
        assert_eq!(session.expires_at, now + Duration::minutes(30));

        // Five minutes in, still active: second create conflicts.
        let conflict = f
            .manager
            .create(&request(f.group_id, 30), f.admin_id, now + Duration::minutes(5))
            .await;
        assert!(matches!(conflict, Err(EngineError::AlreadyActive)));

        // Past the deadline a new session may start, with a fresh id.
        let replacement = f
            .manager
            .create(&request(f.group_id, 30), f.admin_id, now + Duration::minutes(31))
            .await
            .unwrap();
        assert_ne!(replacement.session_id, session.session_id);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_deadline() {
        let f = fixture();
        let result = f
            .manager
            .create(&request(f.group_id, 121), f.admin_id, t0())
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_requires_admin_rights() {
        let f = fixture();
        let result = f
            .manager
            .create(&request(f.group_id, 30), f.member_id, t0())
            .await;
        assert!(matches!(result, Err(EngineError::NotAuthorized(_))));

        let stranger = f
            .manager
            .create(&request(f.group_id, 30), Uuid::new_v4(), t0())
            .await;
        assert!(matches!(stranger, Err(EngineError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_single_flight_under_race() {
        let f = fixture();
        let manager = Arc::new(f.manager);
        let now = t0();

        let req_a = request(f.group_id, 30);
        let req_b = request(f.group_id, 30);
        let a = manager.create(&req_a, f.admin_id, now);
        let b = manager.create(&req_b, f.admin_id, now);
        let (a, b) = tokio::join!(a, b);

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let conflicts = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(EngineError::AlreadyActive)))
            .count();
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn test_record_response_is_idempotent() {
        let f = fixture();
        let now = t0();
        f.manager
            .create(&request(f.group_id, 30), f.admin_id, now)
            .await
            .unwrap();

        let first = f
            .manager
            .record_response_if_active(f.group_id, f.member_id, Some(Uuid::new_v4()), now)
            .await;
        let second = f
            .manager
            .record_response_if_active(
                f.group_id,
                f.member_id,
                Some(Uuid::new_v4()),
                now + Duration::minutes(1),
            )
            .await;

        assert!(first);
        assert!(!second);

        let progress = f.manager.progress(f.group_id, now).await;
        assert_eq!(progress.responded_count, 1);
    }

    #[tokio::test]
    async fn test_record_response_skips_admins_and_inactive() {
        let f = fixture();
        let now = t0();

        // No session yet
        assert!(
            !f.manager
                .record_response_if_active(f.group_id, f.member_id, None, now)
                .await
        );

        f.manager
            .create(&request(f.group_id, 30), f.admin_id, now)
            .await
            .unwrap();

        // Admins never count as respondents
        assert!(
            !f.manager
                .record_response_if_active(f.group_id, f.admin_id, None, now)
                .await
        );

        // After expiry nothing is recorded
        assert!(
            !f.manager
                .record_response_if_active(
                    f.group_id,
                    f.member_id,
                    None,
                    now + Duration::minutes(30)
                )
                .await
        );
    }

    #[tokio::test]
    async fn test_progress_counts_and_countdown() {
        let f = fixture();
        let now = t0();
        f.manager
            .create(&request(f.group_id, 30), f.admin_id, now)
            .await
            .unwrap();
        f.manager
            .record_response_if_active(f.group_id, f.member_id, None, now + Duration::minutes(2))
            .await;

        let progress = f
            .manager
            .progress(f.group_id, now + Duration::minutes(10))
            .await;
        assert!(progress.active);
        assert_eq!(progress.total_members, 1); // admin excluded
        assert_eq!(progress.responded_count, 1);
        assert_eq!(progress.remaining_seconds, 20 * 60);
        assert!(progress.requested_by_name.is_some());

        // After expiry the snapshot collapses to inactive.
        let after = f
            .manager
            .progress(f.group_id, now + Duration::minutes(40))
            .await;
        assert!(!after.active);
        assert_eq!(after.remaining_seconds, 0);
    }

    #[tokio::test]
    async fn test_end_clears_slot_but_keeps_history() {
        let f = fixture();
        let now = t0();
        f.manager
            .create(&request(f.group_id, 30), f.admin_id, now)
            .await
            .unwrap();
        f.manager
            .record_response_if_active(f.group_id, f.member_id, None, now)
            .await;

        f.manager.end(f.group_id, f.admin_id).await.unwrap();
        assert!(!f.manager.is_active(f.group_id, now));
        // Response rows survive the end of the session
        assert_eq!(f.responses.all_rows().len(), 1);

        // Ending again fails: nothing left to end
        let again = f.manager.end(f.group_id, f.admin_id).await;
        assert!(matches!(again, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_end_requires_admin_rights() {
        let f = fixture();
        f.manager
            .create(&request(f.group_id, 30), f.admin_id, t0())
            .await
            .unwrap();
        let result = f.manager.end(f.group_id, f.member_id).await;
        assert!(matches!(result, Err(EngineError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_sweep_expired_is_idempotent() {
        let f = fixture();
        let now = t0();
        f.manager
            .create(&request(f.group_id, 30), f.admin_id, now)
            .await
            .unwrap();

        // Still active: nothing to sweep
        assert_eq!(f.manager.sweep_expired(now + Duration::minutes(10)), 0);

        let later = now + Duration::minutes(31);
        assert_eq!(f.manager.sweep_expired(later), 1);
        assert_eq!(f.manager.sweep_expired(later), 0);
    }
}
