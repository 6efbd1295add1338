//! Engine composition root.
//!
//! Wires the pure schedule/classification services, the urgent session
//! manager and the reminder ticker behind one facade. Every operation
//! captures `now` once at entry so a whole dashboard is internally
//! consistent even while reports keep arriving.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use shared::Clock;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{CreateUrgentRequest, GroupStatuses, MemberStatus, UrgentSession};
use crate::stores::{GroupScheduleStore, MemberStore, ReportStore, UrgentResponseStore};

use super::jobs::JobScheduler;
use super::notification::NotificationGateway;
use super::reminder::{ReminderJob, ReminderService};
use super::schedule::{next_scheduled_time, previous_scheduled_time};
use super::status::classify;
use super::urgent::{UrgentSessionManager, UrgentSweepJob};

pub struct StatusEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    groups: Arc<dyn GroupScheduleStore>,
    members: Arc<dyn MemberStore>,
    reports: Arc<dyn ReportStore>,
    gateway: Arc<dyn NotificationGateway>,
    urgent: Arc<UrgentSessionManager>,
    reminders: Arc<ReminderService>,
}

impl StatusEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        groups: Arc<dyn GroupScheduleStore>,
        members: Arc<dyn MemberStore>,
        reports: Arc<dyn ReportStore>,
        responses: Arc<dyn UrgentResponseStore>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        let urgent = Arc::new(UrgentSessionManager::new(
            Arc::clone(&members),
            Arc::clone(&responses),
        ));
        let reminders = Arc::new(ReminderService::new(
            &config,
            Arc::clone(&groups),
            Arc::clone(&members),
            Arc::clone(&gateway),
        ));

        Self {
            config,
            clock,
            groups,
            members,
            reports,
            gateway,
            urgent,
            reminders,
        }
    }

    /// The urgent session manager, for embedders that need direct
    /// access (e.g. wiring report submission hooks).
    pub fn urgent_sessions(&self) -> &Arc<UrgentSessionManager> {
        &self.urgent
    }

    /// Register the engine's background jobs (reminder ticker and
    /// expired-session sweep) with a scheduler.
    pub fn register_background_jobs(&self, scheduler: &mut JobScheduler) {
        scheduler.register(ReminderJob::new(
            Arc::clone(&self.reminders),
            Arc::clone(&self.clock),
        ));
        scheduler.register(UrgentSweepJob::new(
            Arc::clone(&self.urgent),
            Arc::clone(&self.clock),
            self.config.urgent.sweep_interval_minutes,
        ));
    }

    /// One reminder tick; normally driven by [`ReminderJob`] but
    /// callable directly by an external scheduler.
    pub async fn tick(&self, now_utc: DateTime<Utc>) -> usize {
        self.reminders.tick(now_utc).await
    }

    /// Full dashboard for a group: one status per accepted member plus
    /// the urgent session snapshot.
    pub async fn compute_group_statuses(
        &self,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> Result<GroupStatuses, EngineError> {
        let now_utc = self.clock.now_utc();

        let requester = self
            .members
            .find_member(group_id, requester_id)
            .await
            .ok_or_else(|| {
                EngineError::NotAuthorized("You are not a member of this group".to_string())
            })?;
        if !requester.is_accepted() {
            return Err(EngineError::NotAuthorized(
                "Your membership is not accepted yet".to_string(),
            ));
        }

        let tz = self
            .groups
            .timezone(group_id)
            .await
            .unwrap_or_else(|| self.config.schedule.default_tz());
        let local_now = now_utc.with_timezone(&tz).naive_local();

        // The schedule is a group-level property: computed once and
        // shared by every member of this request.
        let schedule = self.groups.schedule(group_id).await;
        let previous = previous_scheduled_time(schedule.as_ref(), local_now);
        let next = next_scheduled_time(schedule.as_ref(), local_now);

        let members = self.members.accepted_members(group_id).await;
        let session_active = self.urgent.is_active(group_id, now_utc);

        let mut statuses = Vec::with_capacity(members.len());
        for member in members {
            let last_report_utc = self.reports.last_report_at(group_id, member.user_id).await;
            let last_report_local = last_report_utc.map(|t| t.with_timezone(&tz).naive_local());

            let urgent_responded_at = if session_active {
                self.urgent
                    .responded_at(group_id, member.user_id, now_utc)
                    .await
                    .map(|t| t.with_timezone(&tz).naive_local())
            } else {
                None
            };

            let band = classify(member.role, last_report_local, previous, next, local_now);

            statuses.push(MemberStatus {
                user_id: member.user_id,
                display_name: member.display_name,
                role: member.role,
                has_reported: last_report_utc.is_some(),
                last_report_at: last_report_local,
                color: band.color,
                color_hex: self.config.palette.hex(band.color).to_string(),
                percentage_elapsed: band.percentage_elapsed,
                previous_scheduled: previous,
                next_scheduled: next,
                urgent_responded_at,
            });
        }

        let urgent_session = self.urgent.progress(group_id, now_utc).await;

        Ok(GroupStatuses {
            members: statuses,
            urgent_session,
            server_time: local_now,
            timezone: tz.name().to_string(),
        })
    }

    /// Open an urgent collection window and broadcast it.
    ///
    /// The push goes to every accepted member except the requester,
    /// honoring the notification opt-out, on both channels: urgent
    /// broadcasts are too important for the single-channel rule that
    /// scheduled reminders apply.
    pub async fn create_urgent_session(
        &self,
        request: CreateUrgentRequest,
        requester_id: Uuid,
    ) -> Result<UrgentSession, EngineError> {
        let now_utc = self.clock.now_utc();

        let group_name = self
            .groups
            .group_name(request.group_id)
            .await
            .ok_or_else(|| {
                EngineError::NotFound(format!("Group {} not found", request.group_id))
            })?;

        let session = self.urgent.create(&request, requester_id, now_utc).await?;

        let members = self.members.accepted_members(request.group_id).await;
        let mut tokens = Vec::new();
        for member in &members {
            if member.user_id == requester_id || !member.notifications_enabled {
                continue;
            }
            if let Some(token) = member.device_token.as_deref().filter(|t| !t.is_empty()) {
                tokens.push(token.to_string());
            }
            if let Some(token) = member.web_token.as_deref().filter(|t| !t.is_empty()) {
                tokens.push(token.to_string());
            }
        }

        let sent = if tokens.is_empty() {
            0
        } else {
            let metadata = json!({
                "type": "URGENT_REPORT",
                "group_id": request.group_id,
                "group_name": group_name,
                "deadline_minutes": request.deadline_minutes,
                "session_id": session.session_id,
            });
            self.gateway
                .send_batch(
                    &tokens,
                    &format!("Urgent report: {}", group_name),
                    &session.message,
                    metadata,
                )
                .await
        };

        info!(
            session_id = %session.session_id,
            sent,
            recipients = tokens.len(),
            "Urgent broadcast dispatched"
        );

        Ok(session)
    }

    /// Close the group's urgent session explicitly.
    pub async fn end_urgent_session(
        &self,
        group_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(), EngineError> {
        self.urgent.end(group_id, requester_id).await
    }

    /// Hook for report submission: count the report toward the live
    /// urgent session, if one exists. Returns whether a response row
    /// was recorded.
    pub async fn record_urgent_response(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        report_id: Option<Uuid>,
    ) -> bool {
        let now_utc = self.clock.now_utc();
        self.urgent
            .record_response_if_active(group_id, user_id, report_id, now_utc)
            .await
    }
}
