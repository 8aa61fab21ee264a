//! The data backend contract: row storage plus change notifications.

use crate::domain::{
    Comment, ContentRef, Need, NeedFilter, Report, ReportStatus, TrashedItem, User, VoteCounts,
    VoteDirection, VoteTarget,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neighborly_errors::AppError;
use tokio::sync::broadcast;
use uuid::Uuid;

pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 256;
const TRASH_SUMMARY_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Needs,
    Comments,
    Users,
    Reports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Notifications were dropped; anything may have changed.
    Lagged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, id: Uuid) -> Self {
        Self {
            table,
            kind,
            id: Some(id),
        }
    }
}

/// Change notifications for one table. Dropping it unsubscribes.
pub struct ChangeStream {
    table: Table,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeStream {
    pub fn new(table: Table, rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { table, rx }
    }

    /// Next change to this stream's table, or `None` once the backend is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.table == self.table => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(table = ?self.table, missed, "change stream lagged");
                    return Some(ChangeEvent {
                        table: self.table,
                        kind: ChangeKind::Lagged,
                        id: None,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Live needs matching `filter`, newest first.
    async fn list_needs(&self, filter: &NeedFilter) -> Result<Vec<Need>, AppError>;

    /// A need by id, soft-deleted or not.
    async fn find_need(&self, id: Uuid) -> Result<Option<Need>, AppError>;

    async fn insert_need(&self, need: Need) -> Result<Need, AppError>;

    /// Live comments of a need, oldest first.
    async fn list_comments(&self, need_id: Uuid) -> Result<Vec<Comment>, AppError>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError>;

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, AppError>;

    /// Adds one vote in a single atomic step and returns the stored counters.
    /// Fails with `NotFound` for missing or soft-deleted targets.
    async fn increment_vote(&self, target: VoteTarget, direction: VoteDirection) -> Result<VoteCounts, AppError>;

    /// Sets or clears the soft-delete marker.
    async fn set_deleted(&self, target: ContentRef, at: Option<DateTime<Utc>>) -> Result<(), AppError>;

    /// Removes a row for good, together with rows that depend on it.
    async fn purge(&self, target: ContentRef) -> Result<(), AppError>;

    /// Soft-deleted needs and comments, most recently deleted first.
    async fn list_trash(&self) -> Result<Vec<TrashedItem>, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn upsert_user(&self, user: User) -> Result<User, AppError>;

    async fn insert_report(&self, report: Report) -> Result<Report, AppError>;

    /// Reports, newest first.
    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, AppError>;

    async fn find_recent_report(
        &self,
        reporter_id: Uuid,
        target: ContentRef,
        since: DateTime<Utc>,
    ) -> Result<Option<Report>, AppError>;

    async fn set_report_status(&self, id: Uuid, status: ReportStatus) -> Result<Report, AppError>;

    fn subscribe(&self, table: Table) -> ChangeStream;
}

pub(crate) fn trash_summary(text: &str) -> String {
    let mut summary: String = text.chars().take(TRASH_SUMMARY_CHARS).collect();
    if text.chars().count() > TRASH_SUMMARY_CHARS {
        summary.push('…');
    }
    summary
}

pub(crate) fn not_deletable(target: ContentRef) -> AppError {
    AppError::invalid(format!("{} records cannot be soft-deleted", target.kind()))
}
