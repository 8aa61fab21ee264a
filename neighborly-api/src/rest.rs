//! JSON surface under `/api/v1`. Every failure is an `AppError`, which renders
//! as `{ "message": ... }` with a matching status code.

use crate::extractors::{ClientAddr, CurrentViewer};
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use neighborly_app::domain::{
    Cluster, Comment, ContentRef, Coordinates, HeatTier, Need, NeedCategory, NeedFilter, NewComment, NewNeed,
    NewReport, Proximity, Report, ReportReason, ReportStatus, Role, TrashedItem, User, VoteCounts, VoteDirection,
    VoteTarget,
};
use neighborly_app::AppContext;
use neighborly_errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_RADIUS_M: f64 = 5000.0;

pub fn router<S>() -> Router<S>
where
    AppContext: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/api/v1/needs", get(list_needs).post(create_need))
        .route("/api/v1/needs/{id}", get(get_need))
        .route("/api/v1/needs/{id}/vote", post(vote_need))
        .route("/api/v1/needs/{id}/comments", get(list_comments).post(post_comment))
        .route("/api/v1/comments/{id}", axum::routing::delete(delete_comment))
        .route("/api/v1/comments/{id}/vote", post(vote_comment))
        .route("/api/v1/map/clusters", get(clusters))
        .route("/api/v1/reports", post(file_report))
        .route("/api/v1/admin/reports", get(list_reports))
        .route("/api/v1/admin/reports/{id}", post(review_report))
        .route("/api/v1/admin/trash", get(list_trash))
        .route("/api/v1/admin/moderate", post(moderate))
        .route("/api/v1/admin/users/{id}/role", post(set_role))
}

#[derive(Debug, Default, Deserialize)]
pub struct NeedsQuery {
    category: Option<String>,
    q: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius_m: Option<f64>,
}

impl NeedsQuery {
    fn into_filter(self) -> Result<NeedFilter, AppError> {
        let category = match self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(raw.parse::<NeedCategory>().map_err(AppError::InvalidInput)?),
            None => None,
        };

        let near = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let center = Coordinates::new(lat, lng);
                if !center.is_valid() {
                    return Err(AppError::invalid("coordinates are out of range"));
                }
                let radius_meters = self.radius_m.unwrap_or(DEFAULT_RADIUS_M);
                if !radius_meters.is_finite() || radius_meters <= 0.0 {
                    return Err(AppError::invalid("radius_m must be a positive number"));
                }
                Some(Proximity { center, radius_meters })
            }
            (None, None) => None,
            _ => return Err(AppError::invalid("lat and lng must be given together")),
        };

        Ok(NeedFilter::default()
            .with_category(category)
            .with_search(self.q)
            .with_near(near))
    }
}

async fn list_needs(
    State(ctx): State<AppContext>,
    Query(query): Query<NeedsQuery>,
) -> Result<Json<Vec<Need>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(ctx.needs.list(&filter).await?))
}

async fn create_need(
    State(ctx): State<AppContext>,
    addr: ClientAddr,
    CurrentViewer(viewer): CurrentViewer,
    Json(input): Json<NewNeed>,
) -> Result<(StatusCode, Json<Need>), AppError> {
    addr.check_write(&ctx)?;
    let need = ctx.needs.create(&viewer, input).await?;
    Ok((StatusCode::CREATED, Json(need)))
}

#[derive(Debug, Serialize)]
struct NeedDetail {
    #[serde(flatten)]
    need: Need,
    tier: HeatTier,
}

async fn get_need(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> Result<Json<NeedDetail>, AppError> {
    let need = ctx.needs.get(id).await?;
    let tier = need.heat();
    Ok(Json(NeedDetail { need, tier }))
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    direction: VoteDirection,
}

async fn vote_need(
    State(ctx): State<AppContext>,
    addr: ClientAddr,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteCounts>, AppError> {
    addr.check_write(&ctx)?;
    Ok(Json(ctx.votes.vote(VoteTarget::Need(id), req.direction).await?))
}

async fn vote_comment(
    State(ctx): State<AppContext>,
    addr: ClientAddr,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteCounts>, AppError> {
    addr.check_write(&ctx)?;
    Ok(Json(ctx.votes.vote(VoteTarget::Comment(id), req.direction).await?))
}

async fn list_comments(
    State(ctx): State<AppContext>,
    Path(need_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(ctx.comments.list(need_id).await?))
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
    #[serde(default)]
    parent_id: Option<Uuid>,
}

async fn post_comment(
    State(ctx): State<AppContext>,
    addr: ClientAddr,
    CurrentViewer(viewer): CurrentViewer,
    Path(need_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    addr.check_write(&ctx)?;
    let input = NewComment {
        need_id,
        parent_id: req.parent_id,
        content: req.content,
    };
    let comment = ctx.comments.post(&viewer, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(ctx): State<AppContext>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ctx.comments.delete(&viewer, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clusters(
    State(ctx): State<AppContext>,
    Query(query): Query<NeedsQuery>,
) -> Result<Json<Vec<Cluster>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(ctx.feed.clusters(&filter)))
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    target: ContentRef,
    reason: ReportReason,
    #[serde(default)]
    note: Option<String>,
}

async fn file_report(
    State(ctx): State<AppContext>,
    addr: ClientAddr,
    CurrentViewer(viewer): CurrentViewer,
    Json(req): Json<ReportRequest>,
) -> Result<(StatusCode, Json<Report>), AppError> {
    addr.check_write(&ctx)?;
    let input = NewReport {
        target: req.target,
        reason: req.reason,
        note: req.note,
    };
    let report = ctx.reports.file(&viewer, input).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize)]
struct ReportsQuery {
    status: Option<ReportStatus>,
}

async fn list_reports(
    State(ctx): State<AppContext>,
    CurrentViewer(viewer): CurrentViewer,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<Vec<Report>>, AppError> {
    Ok(Json(ctx.moderation.list_reports(&viewer, query.status).await?))
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    status: ReportStatus,
}

async fn review_report(
    State(ctx): State<AppContext>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(ctx.moderation.resolve_report(&viewer, id, req.status).await?))
}

async fn list_trash(
    State(ctx): State<AppContext>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<Vec<TrashedItem>>, AppError> {
    Ok(Json(ctx.moderation.list_trash(&viewer).await?))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ModerationAction {
    Delete,
    Restore,
    Purge,
}

#[derive(Debug, Deserialize)]
struct ModerateRequest {
    action: ModerationAction,
    target: ContentRef,
}

async fn moderate(
    State(ctx): State<AppContext>,
    CurrentViewer(viewer): CurrentViewer,
    Json(req): Json<ModerateRequest>,
) -> Result<StatusCode, AppError> {
    match req.action {
        ModerationAction::Delete => ctx.moderation.soft_delete(&viewer, req.target).await?,
        ModerationAction::Restore => ctx.moderation.restore(&viewer, req.target).await?,
        ModerationAction::Purge => ctx.moderation.purge(&viewer, req.target).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RoleRequest {
    role: Role,
}

async fn set_role(
    State(ctx): State<AppContext>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(ctx.moderation.set_role(&viewer, id, req.role).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, send, server};
    use axum::http::Method;
    use neighborly_app::infrastructure::DataBackend;
    use serde_json::json;

    fn pharmacy(author_id: Uuid) -> Need {
        NewNeed {
            title: "Pharmacy".to_string(),
            category: NeedCategory::Pharmacy,
            description: None,
            latitude: -6.2,
            longitude: 106.8,
        }
        .into_need(author_id)
    }

    #[test]
    fn test_needs_query_to_filter() {
        let query = NeedsQuery {
            category: Some("pharmacy".to_string()),
            q: Some("  ".to_string()),
            lat: Some(-6.2),
            lng: Some(106.8),
            radius_m: None,
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.category, Some(NeedCategory::Pharmacy));
        assert_eq!(filter.search, None);
        assert_eq!(filter.near.map(|n| n.radius_meters), Some(DEFAULT_RADIUS_M));
    }

    #[test]
    fn test_needs_query_rejects_bad_input() {
        let half = NeedsQuery { lat: Some(1.0), ..Default::default() };
        assert!(matches!(half.into_filter(), Err(AppError::InvalidInput(_))));

        let range = NeedsQuery { lat: Some(91.0), lng: Some(0.0), ..Default::default() };
        assert!(range.into_filter().is_err());

        let category = NeedsQuery { category: Some("Spaceport".to_string()), ..Default::default() };
        assert!(category.into_filter().is_err());
    }

    #[tokio::test]
    async fn test_create_need_requires_sign_in() {
        let server = server(false).await;
        let body = json!({
            "title": "Pharmacy",
            "category": "Pharmacy",
            "description": null,
            "latitude": -6.2,
            "longitude": 106.8,
        });

        let response = send(&server.router, Method::POST, "/api/v1/needs", Some(body), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Please sign in to do that.");
    }

    #[tokio::test]
    async fn test_vote_and_detail() {
        let server = server(false).await;
        let need = server
            .ctx
            .backend
            .insert_need(pharmacy(Uuid::new_v4()))
            .await
            .unwrap();

        let path = format!("/api/v1/needs/{}/vote", need.id);
        let response = send(&server.router, Method::POST, &path, Some(json!({ "direction": "up" })), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["upvotes"], 1);

        let response = send(&server.router, Method::GET, &format!("/api/v1/needs/{}", need.id), None, None).await;
        let detail = body_json(response).await;
        assert_eq!(detail["title"], "Pharmacy");
        assert_eq!(detail["tier"], "New");

        let missing = format!("/api/v1/needs/{}/vote", Uuid::new_v4());
        let response = send(&server.router, Method::POST, &missing, Some(json!({ "direction": "down" })), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes_need_a_moderator() {
        let server = server(true).await;

        let response = send(&server.router, Method::GET, "/api/v1/admin/trash", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let member = server.sign_in("Member", Role::Member).await;
        let response = send(&server.router, Method::GET, "/api/v1/admin/trash", None, Some(&member)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let moderator = server.sign_in("Mod", Role::Moderator).await;
        let response = send(&server.router, Method::GET, "/api/v1/admin/trash", None, Some(&moderator)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_admins_assign_roles() {
        let server = server(true).await;
        let member = server.ctx.backend.upsert_user(User::new("Sari".to_string(), None)).await.unwrap();
        let uri = format!("/api/v1/admin/users/{}/role", member.id);

        let moderator = server.sign_in("Mod", Role::Moderator).await;
        let response = send(&server.router, Method::POST, &uri, Some(json!({ "role": "moderator" })), Some(&moderator)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin = server.sign_in("Admin", Role::Admin).await;
        let response = send(&server.router, Method::POST, &uri, Some(json!({ "role": "moderator" })), Some(&admin)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["role"], "moderator");

        let stored = server.ctx.backend.find_user(member.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Moderator);
    }
}
