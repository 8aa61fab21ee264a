use crate::domain::{VoteCounts, VoteDirection, VoteTarget};
use crate::infrastructure::DataBackend;
use neighborly_errors::AppError;
use std::sync::Arc;

pub struct VoteService {
    backend: Arc<dyn DataBackend>,
}

impl VoteService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    /// One atomic increment on a live need or comment. Per-session
    /// de-duplication happens on the client, rate limiting at the edge.
    pub async fn vote(&self, target: VoteTarget, direction: VoteDirection) -> Result<VoteCounts, AppError> {
        match self.backend.increment_vote(target, direction).await {
            Ok(counts) => {
                tracing::debug!(vote = ?target, ?direction, net = counts.net(), "vote counted");
                Ok(counts)
            }
            Err(e) => {
                tracing::error!(vote = ?target, ?direction, error = %e, "vote failed");
                Err(e)
            }
        }
    }
}
