pub mod entities;
mod comment_repository;
mod need_repository;
mod report_repository;
mod user_repository;
mod vote_repository;

pub use comment_repository::CommentRepository;
pub use need_repository::NeedRepository;
pub use report_repository::ReportRepository;
pub use user_repository::UserRepository;
pub use vote_repository::VoteRepository;

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
use neighborly_errors::AppError;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(opt).await
}

pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let migration = include_str!("../../../../migrations/001_initial.sql");

    for statement in migration.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        // Statements are idempotent (IF NOT EXISTS), a failure here is logged and skipped.
        if let Err(e) = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                statement.to_string(),
            ))
            .await
        {
            tracing::warn!(error = %e, "migration statement failed");
        }
    }

    Ok(())
}

pub(crate) fn db_err(e: DbErr) -> AppError {
    AppError::Backend(e.to_string())
}

/// Postgres-backed storage. Change notifications cover writes made through
/// this process; the feed's periodic refresh picks up everything else.
#[derive(Clone)]
pub struct SeaOrmBackend {
    needs: NeedRepository,
    comments: CommentRepository,
    votes: VoteRepository,
    users: UserRepository,
    reports: ReportRepository,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SeaOrmBackend {
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            needs: NeedRepository::new(db.clone()),
            comments: CommentRepository::new(db.clone()),
            votes: VoteRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            reports: ReportRepository::new(db),
            changes,
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let db = create_connection(database_url).await.map_err(db_err)?;
        run_migrations(&db).await.map_err(db_err)?;
        Ok(Self::new(db))
    }

    fn publish(&self, table: Table, kind: ChangeKind, id: Uuid) {
        let _ = self.changes.send(ChangeEvent::new(table, kind, id));
    }
}

#[async_trait]
impl DataBackend for SeaOrmBackend {
    async fn list_needs(&self, filter: &NeedFilter) -> Result<Vec<Need>, AppError> {
        self.needs.list(filter).await
    }

    async fn find_need(&self, id: Uuid) -> Result<Option<Need>, AppError> {
        self.needs.find_by_id(id).await
    }

    async fn insert_need(&self, need: Need) -> Result<Need, AppError> {
        let need = self.needs.create(&need).await?;
        self.publish(Table::Needs, ChangeKind::Insert, need.id);
        Ok(need)
    }

    async fn list_comments(&self, need_id: Uuid) -> Result<Vec<Comment>, AppError> {
        self.comments.list_for_need(need_id).await
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        self.comments.find_by_id(id).await
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, AppError> {
        let comment = self.comments.create(&comment).await?;
        self.publish(Table::Comments, ChangeKind::Insert, comment.id);
        Ok(comment)
    }

    async fn increment_vote(&self, target: VoteTarget, direction: VoteDirection) -> Result<VoteCounts, AppError> {
        let counts = self.votes.increment(target, direction).await?;
        let table = match target {
            VoteTarget::Need(_) => Table::Needs,
            VoteTarget::Comment(_) => Table::Comments,
        };
        self.publish(table, ChangeKind::Update, target.id());
        Ok(counts)
    }

    async fn set_deleted(&self, target: ContentRef, at: Option<DateTime<Utc>>) -> Result<(), AppError> {
        match target {
            ContentRef::Need(id) => {
                self.needs.set_deleted(id, at).await?;
                self.publish(Table::Needs, ChangeKind::Update, id);
            }
            ContentRef::Comment(id) => {
                self.comments.set_deleted(id, at).await?;
                self.publish(Table::Comments, ChangeKind::Update, id);
            }
            ContentRef::User(_) => return Err(not_deletable(target)),
        }
        Ok(())
    }

    async fn purge(&self, target: ContentRef) -> Result<(), AppError> {
        match target {
            ContentRef::Need(id) => {
                self.needs.delete(id).await?;
                self.publish(Table::Needs, ChangeKind::Delete, id);
            }
            ContentRef::Comment(id) => {
                self.comments.delete(id).await?;
                self.publish(Table::Comments, ChangeKind::Delete, id);
            }
            ContentRef::User(_) => return Err(not_deletable(target)),
        }
        Ok(())
    }

    async fn list_trash(&self) -> Result<Vec<TrashedItem>, AppError> {
        let needs = self.needs.list_deleted().await?;
        let comments = self.comments.list_deleted().await?;

        let needs = needs.into_iter().filter_map(|n| {
            n.deleted_at.map(|deleted_at| TrashedItem {
                target: ContentRef::Need(n.id),
                summary: trash_summary(&n.title),
                deleted_at,
            })
        });
        let comments = comments.into_iter().filter_map(|c| {
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
        self.users.find_by_id(id).await
    }

    async fn upsert_user(&self, user: User) -> Result<User, AppError> {
        let user = self.users.upsert(&user).await?;
        self.publish(Table::Users, ChangeKind::Update, user.id);
        Ok(user)
    }

    async fn insert_report(&self, report: Report) -> Result<Report, AppError> {
        let report = self.reports.create(&report).await?;
        self.publish(Table::Reports, ChangeKind::Insert, report.id);
        Ok(report)
    }

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, AppError> {
        self.reports.list(status).await
    }

    async fn find_recent_report(
        &self,
        reporter_id: Uuid,
        target: ContentRef,
        since: DateTime<Utc>,
    ) -> Result<Option<Report>, AppError> {
        self.reports.find_recent(reporter_id, target, since).await
    }

    async fn set_report_status(&self, id: Uuid, status: ReportStatus) -> Result<Report, AppError> {
        let report = self.reports.set_status(id, status).await?;
        self.publish(Table::Reports, ChangeKind::Update, id);
        Ok(report)
    }

    fn subscribe(&self, table: Table) -> ChangeStream {
        ChangeStream::new(table, self.changes.subscribe())
    }
}
