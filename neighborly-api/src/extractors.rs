use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;
use neighborly_app::domain::Viewer;
use neighborly_app::infrastructure::security::ClientIp;
use neighborly_app::infrastructure::DataBackend;
use neighborly_app::AppContext;
use neighborly_errors::AppError;
use neighborly_ui::api::SESSION_USER_KEY;
use std::convert::Infallible;
use std::net::SocketAddr;
use tower_sessions::Session;
use uuid::Uuid;

/// Caller address. Proxy headers count only when `TRUST_FORWARDED_FOR` is on.
pub struct ClientAddr(pub ClientIp);

impl ClientAddr {
    pub fn from_parts(parts: &Parts, trust_forwarded: bool) -> Self {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Self(ClientIp::resolve(
            header("x-forwarded-for"),
            header("x-real-ip"),
            peer,
            trust_forwarded,
        ))
    }

    /// Applies the per-IP write limit.
    pub fn check_write(&self, ctx: &AppContext) -> Result<(), AppError> {
        ctx.rate_limiter.check(self.0 .0)
    }
}

impl<S> FromRequestParts<S> for ClientAddr
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AppContext::from_ref(state);
        Ok(Self::from_parts(parts, ctx.config.trust_forwarded_for))
    }
}

/// The signed-in user behind the session cookie, or an anonymous viewer.
pub struct CurrentViewer(pub Viewer);

impl<S> FromRequestParts<S> for CurrentViewer
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        let user_id: Option<Uuid> = session
            .get(SESSION_USER_KEY)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let Some(user_id) = user_id else {
            return Ok(Self(Viewer::anonymous()));
        };

        let ctx = AppContext::from_ref(state);
        match ctx.backend.find_user(user_id).await? {
            Some(user) => Ok(Self(Viewer::signed_in(user))),
            None => {
                tracing::warn!(user = %user_id, "session refers to unknown user");
                Ok(Self(Viewer::anonymous()))
            }
        }
    }
}
