use super::db_err;
use super::entities::{need, Need};
use crate::domain::{self, NeedCategory, NeedFilter};
use neighborly_errors::AppError;
use sea_orm::{entity::*, query::*, DatabaseConnection};
use uuid::Uuid;

#[derive(Clone)]
pub struct NeedRepository {
    db: DatabaseConnection,
}

impl NeedRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: &domain::Need) -> Result<domain::Need, AppError> {
        let active = need::ActiveModel {
            id: Set(data.id),
            title: Set(data.title.clone()),
            category: Set(data.category.label().to_string()),
            description: Set(data.description.clone()),
            latitude: Set(data.latitude),
            longitude: Set(data.longitude),
            upvotes: Set(data.upvotes),
            downvotes: Set(data.downvotes),
            user_id: Set(data.author_id),
            created_at: Set(data.created_at),
            deleted_at: Set(data.deleted_at),
        };
        active.insert(&self.db).await.map(to_domain).map_err(db_err)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<domain::Need>, AppError> {
        Need::find_by_id(id)
            .one(&self.db)
            .await
            .map(|m| m.map(to_domain))
            .map_err(db_err)
    }

    /// Category and soft-delete filtering happen in SQL, text search and
    /// distance in memory.
    pub async fn list(&self, filter: &NeedFilter) -> Result<Vec<domain::Need>, AppError> {
        let mut query = Need::find().filter(need::Column::DeletedAt.is_null());
        if let Some(category) = filter.category {
            query = query.filter(need::Column::Category.eq(category.label()));
        }

        let rows = query
            .order_by_desc(need::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(filter.apply(rows.into_iter().map(to_domain)))
    }

    pub async fn list_deleted(&self) -> Result<Vec<domain::Need>, AppError> {
        Need::find()
            .filter(need::Column::DeletedAt.is_not_null())
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(to_domain).collect())
            .map_err(db_err)
    }

    pub async fn set_deleted(
        &self,
        id: Uuid,
        at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), AppError> {
        let model = Need::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("Need"))?;

        let mut active: need::ActiveModel = model.into();
        active.deleted_at = Set(at);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    /// Comments go with it through the foreign key cascade.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = Need::delete_by_id(id).exec(&self.db).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Need"));
        }
        Ok(())
    }
}

fn to_domain(m: need::Model) -> domain::Need {
    let category = m.category.parse().unwrap_or_else(|_| {
        tracing::warn!(need = %m.id, category = %m.category, "unknown need category");
        NeedCategory::Other
    });

    domain::Need {
        id: m.id,
        title: m.title,
        category,
        description: m.description,
        latitude: m.latitude,
        longitude: m.longitude,
        upvotes: m.upvotes,
        downvotes: m.downvotes,
        author_id: m.user_id,
        created_at: m.created_at,
        deleted_at: m.deleted_at,
    }
}
