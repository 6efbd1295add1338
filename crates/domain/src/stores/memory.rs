//! In-memory store implementations.
//!
//! These back the engine's tests and small single-process deployments.
//! Each store serializes access through one `Mutex`, which is what
//! makes `insert_if_absent` an atomic existence-check-plus-insert (the
//! in-memory stand-in for a database uniqueness constraint).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::models::{Member, ScheduleConfig, UrgentResponse};

use super::{GroupScheduleStore, MemberStore, ReportStore, UrgentResponseStore};

/// Membership store keyed by group.
#[derive(Debug, Default)]
pub struct InMemoryMemberStore {
    members: Mutex<HashMap<Uuid, Vec<Member>>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a membership.
    pub fn upsert(&self, group_id: Uuid, member: Member) {
        let mut members = self.members.lock().unwrap();
        let group = members.entry(group_id).or_default();
        group.retain(|m| m.user_id != member.user_id);
        group.push(member);
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn accepted_members(&self, group_id: Uuid) -> Vec<Member> {
        self.members
            .lock()
            .unwrap()
            .get(&group_id)
            .map(|group| {
                group
                    .iter()
                    .filter(|m| m.is_accepted())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn find_member(&self, group_id: Uuid, user_id: Uuid) -> Option<Member> {
        self.members
            .lock()
            .unwrap()
            .get(&group_id)
            .and_then(|group| group.iter().find(|m| m.user_id == user_id).cloned())
    }
}

/// Report store tracking only the most recent submission per member.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    last_reports: Mutex<HashMap<(Uuid, Uuid), DateTime<Utc>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submission; keeps the later of the stored and given
    /// instants.
    pub fn record_report(&self, group_id: Uuid, user_id: Uuid, submitted_at: DateTime<Utc>) {
        let mut last_reports = self.last_reports.lock().unwrap();
        let entry = last_reports.entry((group_id, user_id)).or_insert(submitted_at);
        if submitted_at > *entry {
            *entry = submitted_at;
        }
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn last_report_at(&self, group_id: Uuid, user_id: Uuid) -> Option<DateTime<Utc>> {
        self.last_reports
            .lock()
            .unwrap()
            .get(&(group_id, user_id))
            .copied()
    }
}

/// Group record held by [`InMemoryGroupStore`].
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub name: String,
    pub schedule: Option<ScheduleConfig>,
    pub timezone: Option<Tz>,
}

/// Group schedule store.
#[derive(Debug, Default)]
pub struct InMemoryGroupStore {
    groups: Mutex<HashMap<Uuid, GroupRecord>>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, group_id: Uuid, record: GroupRecord) {
        self.groups.lock().unwrap().insert(group_id, record);
    }

    pub fn set_schedule(&self, group_id: Uuid, schedule: Option<ScheduleConfig>) {
        if let Some(record) = self.groups.lock().unwrap().get_mut(&group_id) {
            record.schedule = schedule;
        }
    }
}

#[async_trait]
impl GroupScheduleStore for InMemoryGroupStore {
    async fn schedule(&self, group_id: Uuid) -> Option<ScheduleConfig> {
        self.groups
            .lock()
            .unwrap()
            .get(&group_id)
            .and_then(|record| record.schedule.clone())
    }

    async fn timezone(&self, group_id: Uuid) -> Option<Tz> {
        self.groups
            .lock()
            .unwrap()
            .get(&group_id)
            .and_then(|record| record.timezone)
    }

    async fn group_name(&self, group_id: Uuid) -> Option<String> {
        self.groups
            .lock()
            .unwrap()
            .get(&group_id)
            .map(|record| record.name.clone())
    }

    async fn scheduled_group_ids(&self) -> Vec<Uuid> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, record)| record.schedule.is_some())
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Urgent response store with a (session, user) uniqueness guarantee.
#[derive(Debug, Default)]
pub struct InMemoryUrgentResponseStore {
    rows: Mutex<Vec<UrgentResponse>>,
}

impl InMemoryUrgentResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded rows, for history inspection.
    pub fn all_rows(&self) -> Vec<UrgentResponse> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrgentResponseStore for InMemoryUrgentResponseStore {
    async fn insert_if_absent(&self, response: UrgentResponse) -> bool {
        let mut rows = self.rows.lock().unwrap();
        let exists = rows
            .iter()
            .any(|r| r.session_id == response.session_id && r.user_id == response.user_id);
        if exists {
            return false;
        }
        rows.push(response);
        true
    }

    async fn count_for_session(&self, session_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.session_id == session_id)
            .count()
    }

    async fn responded_at(&self, session_id: Uuid, user_id: Uuid) -> Option<DateTime<Utc>> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.session_id == session_id && r.user_id == user_id)
            .map(|r| r.responded_at)
    }
}
