use super::db_err;
use super::entities::{report, Report};
use crate::domain::{self, ContentRef, ReportReason, ReportStatus};
use neighborly_errors::AppError;
use sea_orm::{entity::*, query::*, DatabaseConnection};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: &domain::Report) -> Result<domain::Report, AppError> {
        let active = report::ActiveModel {
            id: Set(data.id),
            reporter_id: Set(data.reporter_id),
            target_type: Set(data.target.kind().to_string()),
            target_id: Set(data.target.id()),
            reason: Set(data.reason.label().to_string()),
            note: Set(data.note.clone()),
            status: Set(data.status.as_str().to_string()),
            created_at: Set(data.created_at),
        };
        let model = active.insert(&self.db).await.map_err(db_err)?;
        to_domain(model)
    }

    pub async fn list(&self, status: Option<ReportStatus>) -> Result<Vec<domain::Report>, AppError> {
        let mut query = Report::find();
        if let Some(status) = status {
            query = query.filter(report::Column::Status.eq(status.as_str()));
        }

        query
            .order_by_desc(report::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    pub async fn find_recent(
        &self,
        reporter_id: Uuid,
        target: ContentRef,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<domain::Report>, AppError> {
        Report::find()
            .filter(report::Column::ReporterId.eq(reporter_id))
            .filter(report::Column::TargetType.eq(target.kind()))
            .filter(report::Column::TargetId.eq(target.id()))
            .filter(report::Column::CreatedAt.gte(since))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(to_domain)
            .transpose()
    }

    pub async fn set_status(&self, id: Uuid, status: ReportStatus) -> Result<domain::Report, AppError> {
        let model = Report::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("Report"))?;

        let mut active: report::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        let model = active.update(&self.db).await.map_err(db_err)?;
        to_domain(model)
    }
}

fn to_domain(m: report::Model) -> Result<domain::Report, AppError> {
    let target = ContentRef::from_parts(&m.target_type, m.target_id)
        .ok_or_else(|| AppError::Internal(format!("report {} has target type {}", m.id, m.target_type)))?;

    Ok(domain::Report {
        id: m.id,
        reporter_id: m.reporter_id,
        target,
        reason: ReportReason::parse(&m.reason).unwrap_or(ReportReason::Other),
        note: m.note,
        status: ReportStatus::parse(&m.status).unwrap_or(ReportStatus::Pending),
        created_at: m.created_at,
    })
}
