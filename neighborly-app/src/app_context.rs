use crate::application::{
    CommentService, LiveFeed, ModerationService, NeedService, ReportService, VoteService,
};
use crate::config::AppConfig;
use crate::infrastructure::security::RateLimiter;
use crate::infrastructure::{DataBackend, MemoryBackend, SeaOrmBackend};
use neighborly_errors::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn DataBackend>,
    pub needs: Arc<NeedService>,
    pub comments: Arc<CommentService>,
    pub votes: Arc<VoteService>,
    pub moderation: Arc<ModerationService>,
    pub reports: Arc<ReportService>,
    pub feed: Arc<LiveFeed>,
    pub rate_limiter: RateLimiter,
}

impl AppContext {
    /// Wires every service to `backend` and starts the live feed.
    pub fn new(config: AppConfig, backend: Arc<dyn DataBackend>) -> Self {
        Self {
            needs: Arc::new(NeedService::new(backend.clone())),
            comments: Arc::new(CommentService::new(backend.clone())),
            votes: Arc::new(VoteService::new(backend.clone())),
            moderation: Arc::new(ModerationService::new(backend.clone())),
            reports: Arc::new(ReportService::new(backend.clone())),
            feed: Arc::new(LiveFeed::start(backend.clone(), config.refresh_interval)),
            rate_limiter: RateLimiter::new(config.writes_per_minute, config.writes_per_hour),
            backend,
            config: Arc::new(config),
        }
    }

    pub async fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let backend: Arc<dyn DataBackend> = match &config.database_url {
            Some(url) => {
                tracing::info!("Using Postgres backend");
                Arc::new(SeaOrmBackend::connect(url).await?)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory backend");
                Arc::new(MemoryBackend::new())
            }
        };
        Ok(Self::new(config, backend))
    }

    pub async fn from_env() -> Result<Self, AppError> {
        Self::from_config(AppConfig::from_env()?).await
    }
}
