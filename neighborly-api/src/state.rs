use axum::extract::FromRef;
use leptos::config::LeptosOptions;
use neighborly_app::AppContext;

/// Router state: leptos settings for the SSR routes, the application for
/// everything else.
#[derive(Clone)]
pub struct ServerState {
    pub leptos_options: LeptosOptions,
    pub ctx: AppContext,
}

impl FromRef<ServerState> for LeptosOptions {
    fn from_ref(state: &ServerState) -> Self {
        state.leptos_options.clone()
    }
}

impl FromRef<ServerState> for AppContext {
    fn from_ref(state: &ServerState) -> Self {
        state.ctx.clone()
    }
}
