//! Session endpoints. Real sign-in happens elsewhere and only leaves a
//! `user_id` in the session; `dev-login` stands in for it locally.

use crate::extractors::CurrentViewer;
use axum::extract::{FromRef, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use neighborly_app::domain::{Role, User};
use neighborly_app::AppContext;
use neighborly_errors::AppError;
use neighborly_ui::api::SESSION_USER_KEY;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const MAX_NAME_CHARS: usize = 100;

pub fn router<S>() -> Router<S>
where
    AppContext: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/dev-login", post(dev_login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Serialize)]
struct Me {
    authenticated: bool,
    user: Option<User>,
    dev_login: bool,
}

async fn me(State(ctx): State<AppContext>, CurrentViewer(viewer): CurrentViewer) -> Json<Me> {
    Json(Me {
        authenticated: viewer.is_signed_in(),
        user: viewer.user,
        dev_login: ctx.config.allow_dev_login,
    })
}

#[derive(Debug, Deserialize)]
struct DevLogin {
    name: String,
}

async fn dev_login(
    State(ctx): State<AppContext>,
    session: Session,
    Form(form): Form<DevLogin>,
) -> Result<Redirect, AppError> {
    if !ctx.config.allow_dev_login {
        return Err(AppError::not_found("Page"));
    }

    let name = form.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::invalid(format!("Name must be 1 to {MAX_NAME_CHARS} characters")));
    }

    let role = if ctx.config.admin_names.iter().any(|admin| admin == name) {
        Role::Admin
    } else {
        Role::Member
    };
    let user = ctx
        .backend
        .upsert_user(User::new(name.to_string(), None).with_role(role))
        .await?;
    session.cycle_id().await.map_err(session_error)?;
    session.insert(SESSION_USER_KEY, user.id).await.map_err(session_error)?;

    tracing::info!(user = %user.id, role = role.as_str(), "development sign-in");
    Ok(Redirect::to("/"))
}

async fn logout(session: Session) -> Result<Redirect, AppError> {
    session.flush().await.map_err(session_error)?;
    Ok(Redirect::to("/"))
}

fn session_error(e: tower_sessions::session::Error) -> AppError {
    tracing::error!(error = %e, "session store failed");
    AppError::Internal(e.to_string())
}
