use super::db_err;
use super::entities::{comment, need, Comment, Need};
use crate::domain::{VoteCounts, VoteDirection, VoteTarget};
use neighborly_errors::AppError;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseConnection};
use uuid::Uuid;

#[derive(Clone)]
pub struct VoteRepository {
    db: DatabaseConnection,
}

impl VoteRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// `UPDATE .. SET upvotes = upvotes + 1`, so concurrent voters never
    /// overwrite each other's increments.
    pub async fn increment(&self, target: VoteTarget, direction: VoteDirection) -> Result<VoteCounts, AppError> {
        match target {
            VoteTarget::Need(id) => self.increment_need(id, direction).await,
            VoteTarget::Comment(id) => self.increment_comment(id, direction).await,
        }
    }

    async fn increment_need(&self, id: Uuid, direction: VoteDirection) -> Result<VoteCounts, AppError> {
        let column = match direction {
            VoteDirection::Up => need::Column::Upvotes,
            VoteDirection::Down => need::Column::Downvotes,
        };

        let result = Need::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(need::Column::Id.eq(id))
            .filter(need::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Need"));
        }

        let row = Need::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("Need"))?;
        Ok(VoteCounts::new(row.upvotes, row.downvotes))
    }

    async fn increment_comment(&self, id: Uuid, direction: VoteDirection) -> Result<VoteCounts, AppError> {
        let column = match direction {
            VoteDirection::Up => comment::Column::Upvotes,
            VoteDirection::Down => comment::Column::Downvotes,
        };

        let result = Comment::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Comment"));
        }

        let row = Comment::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("Comment"))?;
        Ok(VoteCounts::new(row.upvotes, row.downvotes))
    }
}
