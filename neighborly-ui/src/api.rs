//! Server functions called by the pages. Errors travel as `AppError` display
//! text and are recovered on the client with `AppError::from_server_error`.

use leptos::prelude::*;
use neighborly_app::domain::{Cluster, Comment, Need, NewNeed, User, VoteCounts};
use server_fn::ServerFnError;
use uuid::Uuid;

/// Session key holding the signed-in user's id.
pub const SESSION_USER_KEY: &str = "user_id";

#[cfg(feature = "ssr")]
mod ssr {
    use super::SESSION_USER_KEY;
    use leptos::prelude::*;
    use neighborly_app::domain::Viewer;
    use neighborly_app::infrastructure::security::ClientIp;
    use neighborly_app::infrastructure::DataBackend;
    use neighborly_app::AppContext;
    use neighborly_errors::AppError;
    use server_fn::ServerFnError;
    use tower_sessions::Session;

    pub fn context() -> Result<AppContext, ServerFnError> {
        use_context::<AppContext>()
            .ok_or_else(|| AppError::Internal("application context missing".to_string()).into_server_error())
    }

    /// Resolves the session's user. A missing session or an unknown id is
    /// treated as an anonymous visitor.
    pub async fn viewer(ctx: &AppContext) -> Result<Viewer, ServerFnError> {
        let Ok(session) = leptos_axum::extract::<Session>().await else {
            return Ok(Viewer::anonymous());
        };

        let user_id: Option<uuid::Uuid> = session.get(SESSION_USER_KEY).await.ok().flatten();
        let Some(user_id) = user_id else {
            return Ok(Viewer::anonymous());
        };

        let user = ctx
            .backend
            .find_user(user_id)
            .await
            .map_err(AppError::into_server_error)?;
        if user.is_none() {
            tracing::warn!(user = %user_id, "session refers to unknown user");
        }
        Ok(user.map(Viewer::signed_in).unwrap_or_default())
    }

    pub fn check_write_limit(ctx: &AppContext) -> Result<(), ServerFnError> {
        let ip = use_context::<ClientIp>().unwrap_or_else(ClientIp::localhost);
        ctx.rate_limiter.check(ip.0).map_err(AppError::into_server_error)
    }
}

#[server(GetCurrentUserFn, "/api", endpoint = "current_user")]
pub async fn get_current_user() -> Result<Option<User>, ServerFnError> {
    let ctx = ssr::context()?;
    Ok(ssr::viewer(&ctx).await?.user)
}

/// Whether the local `dev-login` form should be offered.
#[server(DevLoginEnabledFn, "/api", endpoint = "dev_login_enabled")]
pub async fn dev_login_enabled() -> Result<bool, ServerFnError> {
    Ok(ssr::context()?.config.allow_dev_login)
}

#[server(ListClustersFn, "/api", endpoint = "list_clusters")]
pub async fn list_clusters(
    category: Option<String>,
    search: Option<String>,
) -> Result<Vec<Cluster>, ServerFnError> {
    use neighborly_app::domain::{NeedCategory, NeedFilter};
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;

    let category = match category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => Some(
            raw.parse::<NeedCategory>()
                .map_err(|e| AppError::InvalidInput(e).into_server_error())?,
        ),
        None => None,
    };
    let filter = NeedFilter::default().with_category(category).with_search(search);

    let mut clusters = ctx.feed.clusters(&filter);
    clusters.sort_by(|a, b| b.tier.cmp(&a.tier));
    Ok(clusters)
}

#[server(CreateNeedFn, "/api", endpoint = "create_need")]
pub async fn create_need(input: NewNeed) -> Result<Need, ServerFnError> {
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    ssr::check_write_limit(&ctx)?;
    let viewer = ssr::viewer(&ctx).await?;

    ctx.needs
        .create(&viewer, input)
        .await
        .map_err(AppError::into_server_error)
}

#[server(GetNeedFn, "/api", endpoint = "get_need")]
pub async fn get_need(id: Uuid) -> Result<Need, ServerFnError> {
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    ctx.needs.get(id).await.map_err(AppError::into_server_error)
}

#[server(ListCommentsFn, "/api", endpoint = "list_comments")]
pub async fn list_comments(need_id: Uuid) -> Result<Vec<Comment>, ServerFnError> {
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    ctx.comments.list(need_id).await.map_err(AppError::into_server_error)
}

#[server(CastVoteFn, "/api", endpoint = "cast_vote")]
pub async fn cast_vote(kind: String, id: Uuid, up: bool) -> Result<VoteCounts, ServerFnError> {
    use neighborly_app::domain::{VoteDirection, VoteTarget};
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    ssr::check_write_limit(&ctx)?;

    let target = match kind.as_str() {
        "need" => VoteTarget::Need(id),
        "comment" => VoteTarget::Comment(id),
        other => {
            return Err(AppError::invalid(format!("cannot vote on {other}")).into_server_error());
        }
    };
    let direction = if up { VoteDirection::Up } else { VoteDirection::Down };

    ctx.votes
        .vote(target, direction)
        .await
        .map_err(AppError::into_server_error)
}

#[server(PostCommentFn, "/api", endpoint = "post_comment")]
pub async fn post_comment(
    need_id: Uuid,
    parent_id: Option<Uuid>,
    content: String,
) -> Result<Comment, ServerFnError> {
    use neighborly_app::domain::NewComment;
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    ssr::check_write_limit(&ctx)?;
    let viewer = ssr::viewer(&ctx).await?;

    ctx.comments
        .post(&viewer, NewComment { need_id, parent_id, content })
        .await
        .map_err(AppError::into_server_error)
}

#[server(DeleteCommentFn, "/api", endpoint = "delete_comment")]
pub async fn delete_comment(id: Uuid) -> Result<(), ServerFnError> {
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    let viewer = ssr::viewer(&ctx).await?;
    ctx.comments
        .delete(&viewer, id)
        .await
        .map_err(AppError::into_server_error)
}

#[server(FileReportFn, "/api", endpoint = "file_report")]
pub async fn file_report(
    kind: String,
    id: Uuid,
    reason: String,
    note: Option<String>,
) -> Result<(), ServerFnError> {
    use neighborly_app::domain::{ContentRef, NewReport, ReportReason};
    use neighborly_errors::AppError;

    let ctx = ssr::context()?;
    ssr::check_write_limit(&ctx)?;
    let viewer = ssr::viewer(&ctx).await?;

    let target = ContentRef::from_parts(&kind, id)
        .ok_or_else(|| AppError::invalid(format!("cannot report {kind}")).into_server_error())?;
    let reason = ReportReason::parse(&reason)
        .ok_or_else(|| AppError::invalid(format!("unknown reason: {reason}")).into_server_error())?;

    ctx.reports
        .file(&viewer, NewReport { target, reason, note })
        .await
        .map(|_| ())
        .map_err(AppError::into_server_error)
}
