use super::db_err;
use super::entities::{comment, Comment};
use crate::domain;
use neighborly_errors::AppError;
use sea_orm::{entity::*, query::*, DatabaseConnection};
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentRepository {
    db: DatabaseConnection,
}

impl CommentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: &domain::Comment) -> Result<domain::Comment, AppError> {
        let active = comment::ActiveModel {
            id: Set(data.id),
            need_id: Set(data.need_id),
            user_id: Set(data.user_id),
            content: Set(data.content.clone()),
            parent_id: Set(data.parent_id),
            upvotes: Set(data.upvotes),
            downvotes: Set(data.downvotes),
            created_at: Set(data.created_at),
            deleted_at: Set(data.deleted_at),
        };
        active.insert(&self.db).await.map(to_domain).map_err(db_err)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<domain::Comment>, AppError> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await
            .map(|m| m.map(to_domain))
            .map_err(db_err)
    }

    pub async fn list_for_need(&self, need_id: Uuid) -> Result<Vec<domain::Comment>, AppError> {
        Comment::find()
            .filter(comment::Column::NeedId.eq(need_id))
            .filter(comment::Column::DeletedAt.is_null())
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(to_domain).collect())
            .map_err(db_err)
    }

    pub async fn list_deleted(&self) -> Result<Vec<domain::Comment>, AppError> {
        Comment::find()
            .filter(comment::Column::DeletedAt.is_not_null())
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
        let model = Comment::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        let mut active: comment::ActiveModel = model.into();
        active.deleted_at = Set(at);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    /// Replies go with it through the foreign key cascade.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = Comment::delete_by_id(id).exec(&self.db).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Comment"));
        }
        Ok(())
    }
}

fn to_domain(m: comment::Model) -> domain::Comment {
    domain::Comment {
        id: m.id,
        need_id: m.need_id,
        user_id: m.user_id,
        content: m.content,
        parent_id: m.parent_id,
        created_at: m.created_at,
        upvotes: m.upvotes,
        downvotes: m.downvotes,
        deleted_at: m.deleted_at,
    }
}
