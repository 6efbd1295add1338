//! Scheduled reminder ticker.
//!
//! Once per minute, every group with a schedule is checked against the
//! trigger detector in its own time zone. Groups that fire get one
//! push per eligible member: accepted, not an exempt admin,
//! notifications enabled, and on a single channel - the native channel
//! when the member has one, otherwise the web channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, ReminderConfig};
use crate::error::EngineError;
use crate::models::Member;
use crate::stores::{GroupScheduleStore, MemberStore};

use super::jobs::{Job, JobFrequency};
use super::notification::NotificationGateway;
use super::trigger::{should_fire_at, truncate_to_minute};

pub struct ReminderService {
    groups: Arc<dyn GroupScheduleStore>,
    members: Arc<dyn MemberStore>,
    gateway: Arc<dyn NotificationGateway>,
    reminder: ReminderConfig,
    default_tz: chrono_tz::Tz,
}

impl ReminderService {
    pub fn new(
        config: &EngineConfig,
        groups: Arc<dyn GroupScheduleStore>,
        members: Arc<dyn MemberStore>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            groups,
            members,
            gateway,
            reminder: config.reminder.clone(),
            default_tz: config.schedule.default_tz(),
        }
    }

    /// Evaluate one reminder tick.
    ///
    /// Each group is processed in isolation: a failure or a slow
    /// gateway call for one group never stops the rest of the tick.
    /// Returns the total accepted deliveries, for logging only.
    pub async fn tick(&self, now_utc: DateTime<Utc>) -> usize {
        let group_ids = self.groups.scheduled_group_ids().await;
        debug!(groups = group_ids.len(), "Reminder tick");

        let mut total_sent = 0;
        for group_id in group_ids {
            match self.remind_group(group_id, now_utc).await {
                Ok(sent) => total_sent += sent,
                Err(e) => {
                    warn!(
                        group_id = %group_id,
                        error = %e,
                        "Reminder evaluation failed for group, continuing"
                    );
                }
            }
        }

        if total_sent > 0 {
            info!(sent = total_sent, "Sent scheduled reminders");
        }
        total_sent
    }

    async fn remind_group(
        &self,
        group_id: Uuid,
        now_utc: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        let Some(schedule) = self.groups.schedule(group_id).await else {
            return Ok(0);
        };

        let tz = self.groups.timezone(group_id).await.unwrap_or(self.default_tz);
        let local_now = truncate_to_minute(now_utc.with_timezone(&tz).naive_local());

        if !should_fire_at(Some(&schedule), local_now) {
            return Ok(0);
        }

        let group_name = self
            .groups
            .group_name(group_id)
            .await
            .ok_or_else(|| EngineError::NotFound(format!("Group {} not found", group_id)))?;

        let members = self.members.accepted_members(group_id).await;
        let tokens = reminder_tokens(&members);
        if tokens.is_empty() {
            return Ok(0);
        }

        let metadata = json!({
            "type": "REMINDER",
            "group_id": group_id,
            "group_name": group_name,
        });

        let sent = self
            .gateway
            .send_batch(
                &tokens,
                &self.reminder.title,
                &self.reminder.body_for(&group_name),
                metadata,
            )
            .await;

        debug!(group_id = %group_id, sent, recipients = tokens.len(), "Group reminder dispatched");
        Ok(sent)
    }
}

/// Resolve the reminder recipient tokens for a member list.
///
/// One token per member: the native channel suppresses the web channel
/// so nobody is reminded twice in the same tick.
fn reminder_tokens(members: &[Member]) -> Vec<String> {
    members
        .iter()
        .filter(|m| !m.role.is_compliance_exempt())
        .filter(|m| m.notifications_enabled)
        .filter_map(|m| {
            m.device_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .or_else(|| m.web_token.as_deref().filter(|t| !t.is_empty()))
                .map(str::to_string)
        })
        .collect()
}

/// Background job driving [`ReminderService::tick`] once per minute.
pub struct ReminderJob {
    service: Arc<ReminderService>,
    clock: Arc<dyn shared::Clock>,
}

impl ReminderJob {
    pub fn new(service: Arc<ReminderService>, clock: Arc<dyn shared::Clock>) -> Self {
        Self { service, clock }
    }
}

#[async_trait::async_trait]
impl Job for ReminderJob {
    fn name(&self) -> &'static str {
        "schedule_reminders"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    fn align_to_minute(&self) -> bool {
        true
    }

    async fn execute(&self) -> anyhow::Result<()> {
        self.service.tick(self.clock.now_utc()).await;
        Ok(())
    }
}
