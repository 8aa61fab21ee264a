use crate::domain::{Comment, CommentTree, ContentRef, NewComment, Viewer};
use crate::infrastructure::security::InputSanitizer;
use crate::infrastructure::DataBackend;
use neighborly_errors::AppError;
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    backend: Arc<dyn DataBackend>,
}

impl CommentService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    /// Live comments of a need, oldest first.
    pub async fn list(&self, need_id: Uuid) -> Result<Vec<Comment>, AppError> {
        self.backend.list_comments(need_id).await
    }

    pub async fn thread(&self, need_id: Uuid) -> Result<CommentTree, AppError> {
        let comments = self.list(need_id).await?;
        Ok(CommentTree::build(&comments))
    }

    pub async fn post(&self, viewer: &Viewer, input: NewComment) -> Result<Comment, AppError> {
        let user_id = viewer.user_id().ok_or(AppError::Unauthorized)?;
        let content = InputSanitizer::comment(&input.content)?;

        self.backend
            .find_need(input.need_id)
            .await?
            .filter(|n| !n.is_deleted())
            .ok_or_else(|| AppError::not_found("Need"))?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .backend
                .find_comment(parent_id)
                .await?
                .filter(|c| !c.is_deleted())
                .ok_or_else(|| AppError::not_found("Parent comment"))?;
            if parent.need_id != input.need_id {
                return Err(AppError::invalid("Reply must belong to the same need as its parent"));
            }
        }

        let comment = NewComment { content, ..input }.into_comment(user_id);
        let comment = self.backend.insert_comment(comment).await?;
        tracing::info!(comment = %comment.id, need = %comment.need_id, reply = comment.parent_id.is_some(), "comment posted");
        Ok(comment)
    }

    /// Soft delete. The author may delete their own comment, moderators any.
    pub async fn delete(&self, viewer: &Viewer, id: Uuid) -> Result<(), AppError> {
        if !viewer.is_signed_in() {
            return Err(AppError::Unauthorized);
        }

        let comment = self
            .backend
            .find_comment(id)
            .await?
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if !viewer.is_author_of(comment.user_id) && !viewer.can_moderate() {
            return Err(AppError::Forbidden("only the author can delete this comment".to_string()));
        }

        self.backend
            .set_deleted(ContentRef::Comment(id), Some(chrono::Utc::now()))
            .await?;
        tracing::info!(comment = %id, by = ?viewer.user_id(), "comment deleted");
        Ok(())
    }
}
