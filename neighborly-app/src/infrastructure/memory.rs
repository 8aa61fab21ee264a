use super::backend::{
    not_deletable, trash_summary, ChangeEvent, ChangeKind, ChangeStream, DataBackend, Table,
    CHANGE_CHANNEL_CAPACITY,
};
use crate::domain::{
    Comment, ContentRef, Need, NeedFilter, Report, ReportStatus, TrashedItem, User, VoteCounts,
    VoteDirection, VoteTarget,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use neighborly_errors::AppError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// In-process backend for development and tests.
#[derive(Clone)]
pub struct MemoryBackend {
    needs: Arc<DashMap<Uuid, Need>>,
    comments: Arc<DashMap<Uuid, Comment>>,
    users: Arc<DashMap<Uuid, User>>,
    reports: Arc<DashMap<Uuid, Report>>,
    changes: broadcast::Sender<ChangeEvent>,
    unavailable: Arc<AtomicBool>,
    list_delay_ms: Arc<AtomicU64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            needs: Arc::new(DashMap::new()),
            comments: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
            reports: Arc::new(DashMap::new()),
            changes,
            unavailable: Arc::new(AtomicBool::new(false)),
            list_delay_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Makes every call fail with `AppError::Backend` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes every `list_needs` call sleep for `delay` before answering.
    pub fn set_list_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.list_delay_ms.store(millis, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Backend("memory backend marked unavailable".to_string()));
        }
        Ok(())
    }

    fn publish(&self, table: Table, kind: ChangeKind, id: Uuid) {
        // No receivers is fine.
        let _ = self.changes.send(ChangeEvent::new(table, kind, id));
    }

    fn purge_comment_tree(&self, root: Uuid) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if self.comments.remove(&id).is_some() {
                self.publish(Table::Comments, ChangeKind::Delete, id);
            }
            pending.extend(
                self.comments
                    .iter()
                    .filter(|c| c.parent_id == Some(id))
                    .map(|c| c.id),
            );
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn list_needs(&self, filter: &NeedFilter) -> Result<Vec<Need>, AppError> {
        let delay = self.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check_available()?;
        Ok(filter.apply(self.needs.iter().map(|n| n.value().clone())))
    }

    async fn find_need(&self, id: Uuid) -> Result<Option<Need>, AppError> {
        self.check_available()?;
        Ok(self.needs.get(&id).map(|n| n.value().clone()))
    }

    async fn insert_need(&self, need: Need) -> Result<Need, AppError> {
        self.check_available()?;
        self.needs.insert(need.id, need.clone());
        self.publish(Table::Needs, ChangeKind::Insert, need.id);
        Ok(need)
    }

    async fn list_comments(&self, need_id: Uuid) -> Result<Vec<Comment>, AppError> {
        self.check_available()?;
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.need_id == need_id && !c.is_deleted())
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        self.check_available()?;
        Ok(self.comments.get(&id).map(|c| c.value().clone()))
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, AppError> {
        self.check_available()?;
        self.comments.insert(comment.id, comment.clone());
        self.publish(Table::Comments, ChangeKind::Insert, comment.id);
        Ok(comment)
    }

    async fn increment_vote(&self, target: VoteTarget, direction: VoteDirection) -> Result<VoteCounts, AppError> {
        self.check_available()?;

        fn bump(up: &mut i32, down: &mut i32, direction: VoteDirection) -> VoteCounts {
            match direction {
                VoteDirection::Up => *up = up.saturating_add(1),
                VoteDirection::Down => *down = down.saturating_add(1),
            }
            VoteCounts::new(*up, *down)
        }

        // The shard lock held by `get_mut` makes each increment atomic.
        let counts = match target {
            VoteTarget::Need(id) => {
                let mut need = self
                    .needs
                    .get_mut(&id)
                    .filter(|n| !n.is_deleted())
                    .ok_or_else(|| AppError::not_found("Need"))?;
                let need = need.value_mut();
                bump(&mut need.upvotes, &mut need.downvotes, direction)
            }
            VoteTarget::Comment(id) => {
                let mut comment = self
                    .comments
                    .get_mut(&id)
                    .filter(|c| !c.is_deleted())
                    .ok_or_else(|| AppError::not_found("Comment"))?;
                let comment = comment.value_mut();
                bump(&mut comment.upvotes, &mut comment.downvotes, direction)
            }
        };

        let table = match target {
            VoteTarget::Need(_) => Table::Needs,
            VoteTarget::Comment(_) => Table::Comments,
        };
        self.publish(table, ChangeKind::Update, target.id());
        Ok(counts)
    }

    async fn set_deleted(&self, target: ContentRef, at: Option<DateTime<Utc>>) -> Result<(), AppError> {
        self.check_available()?;
        match target {
            ContentRef::Need(id) => {
                let mut need = self.needs.get_mut(&id).ok_or_else(|| AppError::not_found("Need"))?;
                need.deleted_at = at;
                drop(need);
                self.publish(Table::Needs, ChangeKind::Update, id);
            }
            ContentRef::Comment(id) => {
                let mut comment = self
                    .comments
                    .get_mut(&id)
                    .ok_or_else(|| AppError::not_found("Comment"))?;
                comment.deleted_at = at;
                drop(comment);
                self.publish(Table::Comments, ChangeKind::Update, id);
            }
            ContentRef::User(_) => return Err(not_deletable(target)),
        }
        Ok(())
    }

    async fn purge(&self, target: ContentRef) -> Result<(), AppError> {
        self.check_available()?;
        match target {
            ContentRef::Need(id) => {
                self.needs.remove(&id).ok_or_else(|| AppError::not_found("Need"))?;
                self.publish(Table::Needs, ChangeKind::Delete, id);
                let roots: Vec<Uuid> = self
                    .comments
                    .iter()
                    .filter(|c| c.need_id == id)
                    .map(|c| c.id)
                    .collect();
                for root in roots {
                    self.purge_comment_tree(root);
                }
            }
            ContentRef::Comment(id) => {
                if !self.comments.contains_key(&id) {
                    return Err(AppError::not_found("Comment"));
                }
                self.purge_comment_tree(id);
            }
            ContentRef::User(_) => return Err(not_deletable(target)),
        }
        Ok(())
    }

    async fn list_trash(&self) -> Result<Vec<TrashedItem>, AppError> {
        self.check_available()?;
        let needs = self.needs.iter().filter_map(|n| {
            n.deleted_at.map(|deleted_at| TrashedItem {
                target: ContentRef::Need(n.id),
                summary: trash_summary(&n.title),
                deleted_at,
            })
        });
        let comments = self.comments.iter().filter_map(|c| {
            c.deleted_at.map(|deleted_at| TrashedItem {
                target: ContentRef::Comment(c.id),
                summary: trash_summary(&c.content),
                deleted_at,
            })
        });

        let mut items: Vec<TrashedItem> = needs.chain(comments).collect();
        items.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(items)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.check_available()?;
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn upsert_user(&self, mut user: User) -> Result<User, AppError> {
        self.check_available()?;
        if user.created_at.is_none() {
            user.created_at = Some(Utc::now());
        }
        let kind = if self.users.insert(user.id, user.clone()).is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.publish(Table::Users, kind, user.id);
        Ok(user)
    }

    async fn insert_report(&self, report: Report) -> Result<Report, AppError> {
        self.check_available()?;
        self.reports.insert(report.id, report.clone());
        self.publish(Table::Reports, ChangeKind::Insert, report.id);
        Ok(report)
    }

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, AppError> {
        self.check_available()?;
        let mut reports: Vec<Report> = self
            .reports
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .map(|r| r.value().clone())
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn find_recent_report(
        &self,
        reporter_id: Uuid,
        target: ContentRef,
        since: DateTime<Utc>,
    ) -> Result<Option<Report>, AppError> {
        self.check_available()?;
        Ok(self
            .reports
            .iter()
            .find(|r| r.reporter_id == Some(reporter_id) && r.target == target && r.created_at >= since)
            .map(|r| r.value().clone()))
    }

    async fn set_report_status(&self, id: Uuid, status: ReportStatus) -> Result<Report, AppError> {
        self.check_available()?;
        let mut report = self.reports.get_mut(&id).ok_or_else(|| AppError::not_found("Report"))?;
        report.status = status;
        let report = report.value().clone();
        self.publish(Table::Reports, ChangeKind::Update, id);
        Ok(report)
    }

    fn subscribe(&self, table: Table) -> ChangeStream {
        ChangeStream::new(table, self.changes.subscribe())
    }
}
