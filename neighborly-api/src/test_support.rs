use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use neighborly_app::domain::Role;
use neighborly_app::infrastructure::{DataBackend, MemoryBackend};
use neighborly_app::{AppConfig, AppContext};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use uuid::Uuid;

pub struct TestServer {
    pub router: Router,
    pub ctx: AppContext,
}

pub async fn server(allow_dev_login: bool) -> TestServer {
    server_with(AppConfig {
        allow_dev_login,
        ..AppConfig::default()
    })
}

pub fn server_with(config: AppConfig) -> TestServer {
    let ctx = AppContext::new(config, Arc::new(MemoryBackend::new()));
    let router = crate::rest::router()
        .merge(crate::auth::router())
        .layer(SessionManagerLayer::new(MemoryStore::default()))
        .with_state(ctx.clone());

    TestServer { router, ctx }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl TestServer {
    pub async fn dev_login(&self, name: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/dev-login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("name={name}")))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Signs in a fresh user with `role` and returns the session cookie.
    pub async fn sign_in(&self, name: &str, role: Role) -> String {
        let response = self.dev_login(name).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let me = body_json(send(&self.router, Method::GET, "/auth/me", None, Some(&cookie)).await).await;
        let id: Uuid = serde_json::from_value(me["user"]["id"].clone()).unwrap();
        if role != Role::Member {
            let user = self.ctx.backend.find_user(id).await.unwrap().unwrap();
            self.ctx.backend.upsert_user(user.with_role(role)).await.unwrap();
        }
        cookie
    }
}
