use crate::domain::{Need, NeedFilter, NewNeed, Viewer};
use crate::infrastructure::security::{InputSanitizer, MAX_DESCRIPTION_CHARS};
use crate::infrastructure::DataBackend;
use neighborly_errors::AppError;
use std::sync::Arc;
use uuid::Uuid;

pub struct NeedService {
    backend: Arc<dyn DataBackend>,
}

impl NeedService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    pub async fn list(&self, filter: &NeedFilter) -> Result<Vec<Need>, AppError> {
        self.backend.list_needs(filter).await
    }

    /// A live need. Soft-deleted needs are reported as missing.
    pub async fn get(&self, id: Uuid) -> Result<Need, AppError> {
        self.backend
            .find_need(id)
            .await?
            .filter(|n| !n.is_deleted())
            .ok_or_else(|| AppError::not_found("Need"))
    }

    pub async fn create(&self, viewer: &Viewer, input: NewNeed) -> Result<Need, AppError> {
        let author_id = viewer.user_id().ok_or(AppError::Unauthorized)?;

        InputSanitizer::coordinates(input.latitude, input.longitude)?;
        let input = NewNeed {
            title: InputSanitizer::title(&input.title)?,
            description: InputSanitizer::optional_text(
                "Description",
                input.description.as_deref(),
                MAX_DESCRIPTION_CHARS,
            )?,
            ..input
        };

        let need = self.backend.insert_need(input.into_need(author_id)).await?;
        tracing::info!(need = %need.id, category = %need.category, "need posted");
        Ok(need)
    }
}
