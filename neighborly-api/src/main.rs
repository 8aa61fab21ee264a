mod auth;
mod extractors;
mod rest;
mod state;
#[cfg(test)]
mod test_support;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use extractors::ClientAddr;
use leptos::prelude::*;
use leptos_axum::{generate_route_list, handle_server_fns_with_context, LeptosRoutes};
use neighborly_app::AppContext;
use neighborly_ui::App;
use state::ServerState;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let conf = get_configuration(Some("Cargo.toml")).expect("Failed to load Leptos config");
    let leptos_options = conf.leptos_options;
    let addr = leptos_options.site_addr;

    let app_context = match AppContext::from_env().await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "failed to start application");
            std::process::exit(1);
        }
    };

    let routes = generate_route_list(App);
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(tower_sessions::Expiry::OnInactivity(time::Duration::days(7)));

    let state = ServerState {
        leptos_options: leptos_options.clone(),
        ctx: app_context.clone(),
    };

    let app = Router::new()
        .merge(rest::router())
        .merge(auth::router())
        .route("/api/{*fn_name}", post(server_fn_handler))
        .leptos_routes_with_context(
            &state,
            routes,
            {
                let ctx = app_context.clone();
                move || provide_context(ctx.clone())
            },
            {
                let leptos_options = leptos_options.clone();
                move || shell(leptos_options.clone())
            },
        )
        .fallback(leptos_axum::file_and_error_handler::<ServerState, _>(shell))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state);

    tracing::info!("Listening on http://{}", addr);
    tracing::info!(
        writes_per_minute = app_context.config.writes_per_minute,
        writes_per_hour = app_context.config.writes_per_hour,
        dev_login = app_context.config.allow_dev_login,
        trust_forwarded_for = app_context.config.trust_forwarded_for,
        "write limits per client"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("Server error");
}

/// Server functions get the application and the caller's address as context.
async fn server_fn_handler(State(state): State<ServerState>, req: Request<Body>) -> impl IntoResponse {
    let (parts, body) = req.into_parts();
    let client = ClientAddr::from_parts(&parts, state.ctx.config.trust_forwarded_for).0;
    let req = Request::from_parts(parts, body);

    let ctx = state.ctx;
    handle_server_fns_with_context(
        move || {
            provide_context(ctx.clone());
            provide_context(client);
        },
        req,
    )
    .await
}

fn shell(options: LeptosOptions) -> impl IntoView {
    use leptos_meta::*;

    let css = r#"
        :root {
            --base: #faf4ed;
            --surface: #fffaf3;
            --overlay: #f2e9e1;
            --muted: #9893a5;
            --subtle: #797593;
            --text: #575279;
            --love: #b4637a;
            --gold: #ea9d34;
            --pine: #286983;
            --foam: #56949f;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: 'Inter', -apple-system, sans-serif;
            background: var(--base);
            color: var(--text);
            min-height: 100vh;
        }
        a { color: var(--pine); }
        button { font: inherit; cursor: pointer; }
        button:disabled { cursor: not-allowed; opacity: 0.5; }
        .container { max-width: 800px; margin: 0 auto; padding: 1.5rem; }
        .topbar {
            display: flex; justify-content: space-between; align-items: center;
            max-width: 800px; margin: 0 auto; padding: 1rem 1.5rem; border-bottom: 1px solid var(--overlay);
        }
        .topbar__brand { font-weight: 800; font-size: 1.25rem; color: var(--love); text-decoration: none; }
        .auth, .auth__user, .auth__login { display: flex; gap: 0.5rem; align-items: center; }
        .auth__avatar { width: 28px; height: 28px; border-radius: 50%; }
        .auth__input { padding: 0.4rem 0.6rem; border: 2px solid var(--overlay); border-radius: 6px; background: var(--surface); }
        .auth__submit, .auth__logout { padding: 0.4rem 0.8rem; border: none; border-radius: 6px; background: var(--pine); color: var(--base); }
        .hero { text-align: center; padding: 2rem 0 1.5rem; }
        .hero__title { font-size: clamp(1.75rem, 5vw, 2.5rem); color: var(--love); font-weight: 800; margin-bottom: 0.75rem; }
        .hero__subtitle { color: var(--subtle); font-size: 1.05rem; max-width: 520px; margin: 0 auto; }
        .filters { display: flex; flex-wrap: wrap; gap: 0.5rem; margin: 1rem 0; }
        .filters__category, .filters__search {
            padding: 0.6rem 0.8rem; border: 2px solid var(--overlay); border-radius: 8px; background: var(--surface); color: var(--text);
        }
        .filters__search { flex: 1; }
        .filters__submit { padding: 0.6rem 1.2rem; border: none; border-radius: 8px; background: var(--love); color: var(--base); font-weight: 600; }
        .legend { display: flex; gap: 0.4rem; flex-wrap: wrap; margin-bottom: 1rem; }
        .heat { display: inline-block; padding: 0.15rem 0.55rem; border-radius: 999px; color: #fff; font-size: 0.8rem; font-weight: 600; }
        .clusters { list-style: none; display: flex; flex-direction: column; gap: 0.75rem; }
        .clusters__empty { color: var(--muted); text-align: center; padding: 2rem 0; }
        .cluster { background: var(--surface); border: 2px solid var(--overlay); border-left-width: 6px; border-radius: 10px; padding: 1rem; }
        .cluster__header { display: flex; gap: 0.5rem; align-items: center; }
        .cluster__headline { font-weight: 700; flex: 1; }
        .cluster__size, .cluster__location { color: var(--muted); font-size: 0.85rem; }
        .cluster__needs { list-style: none; margin-top: 0.5rem; }
        .cluster__need { display: flex; gap: 0.5rem; padding: 0.25rem 0; }
        .cluster__need a { flex: 1; }
        .cluster__category { color: var(--subtle); font-size: 0.85rem; }
        .cluster__net { font-weight: 700; color: var(--gold); }
        .back { display: inline-block; margin-bottom: 1rem; }
        .need { background: var(--surface); border: 2px solid var(--overlay); border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; }
        .need__header { display: flex; gap: 0.75rem; align-items: center; }
        .need__title { color: var(--love); font-size: 1.5rem; }
        .need__meta { color: var(--muted); font-size: 0.9rem; margin: 0.5rem 0; }
        .need__description { line-height: 1.7; margin: 0.75rem 0; }
        .need__actions, .comment__actions { display: flex; gap: 0.75rem; align-items: center; flex-wrap: wrap; }
        .votes { display: inline-flex; gap: 0.35rem; align-items: center; }
        .votes__button { border: 1px solid var(--overlay); background: var(--base); border-radius: 4px; padding: 0.1rem 0.45rem; color: var(--subtle); }
        .votes__net { font-weight: 700; min-width: 2ch; text-align: center; }
        .votes__error, .thread__error, .composer__error, .report__error { color: var(--love); font-size: 0.85rem; }
        .thread__header { display: flex; justify-content: space-between; align-items: center; margin: 1rem 0 0.5rem; }
        .thread__expand, .comment__toggle, .comment__reply, .comment__delete, .report__toggle, .report__cancel {
            border: none; background: none; color: var(--pine); font-size: 0.85rem;
        }
        .thread__empty, .thread__signin, .comment__hidden { color: var(--muted); font-size: 0.9rem; }
        .comment { border-left: 2px solid var(--overlay); padding: 0.5rem 0 0.5rem 0.75rem; margin-top: 0.5rem; }
        .comment__meta { display: flex; gap: 0.5rem; color: var(--muted); font-size: 0.8rem; }
        .comment__body { margin: 0.25rem 0; white-space: pre-wrap; }
        .composer { display: flex; flex-direction: column; gap: 0.5rem; margin: 0.75rem 0; }
        .composer__input, .report__note, .report__reason {
            padding: 0.6rem; border: 2px solid var(--overlay); border-radius: 8px; background: var(--surface); color: var(--text); font: inherit;
        }
        .composer__input { min-height: 4rem; }
        .composer__footer { display: flex; justify-content: space-between; align-items: center; }
        .composer__remaining { color: var(--muted); font-size: 0.8rem; }
        .composer__remaining--over { color: var(--love); }
        .composer__submit, .report__submit { padding: 0.45rem 1rem; border: none; border-radius: 6px; background: var(--pine); color: var(--base); }
        .report__form { display: flex; flex-direction: column; gap: 0.5rem; margin-top: 0.5rem; }
        .report__actions { display: flex; gap: 0.5rem; }
        .report__sent { color: var(--foam); font-size: 0.85rem; }
        .loading { display: flex; flex-direction: column; align-items: center; padding: 3rem; }
        .loading__spinner {
            width: 50px; height: 50px; border: 4px solid var(--overlay);
            border-top-color: var(--gold); border-radius: 50%; animation: spin 1s linear infinite;
        }
        @keyframes spin { to { transform: rotate(360deg); } }
        .loading__text { margin-top: 1rem; color: var(--subtle); font-style: italic; }
        .error { background: #fce8ec; border: 2px solid var(--love); border-radius: 8px; padding: 1.25rem; margin: 2rem 0; }
        .error__title { color: var(--love); font-weight: 700; margin-bottom: 0.5rem; }
        .error__message { color: #8b3d4d; }
        .error__retry { margin-top: 1rem; padding: 0.5rem 1rem; background: var(--love); color: var(--base); border: none; border-radius: 4px; }
    "#;

    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <link rel="icon" href="data:image/svg+xml,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'><text y='.9em' font-size='90'>📍</text></svg>"/>
                <style>{css}</style>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}
