pub mod api;
pub mod components;
pub mod pages;

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use components::AuthBar;
use pages::{MapPage, NeedDetailPage};

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Neighborly | What does your neighborhood need?"/>
        <Meta name="description" content="Post and vote on what your neighborhood is missing"/>
        <Stylesheet id="leptos" href="/pkg/neighborly.css"/>

        <Router>
            <header class="topbar">
                <a href="/" class="topbar__brand">"Neighborly"</a>
                <AuthBar/>
            </header>
            <main class="container">
                <Routes fallback=|| "Page not found">
                    <Route path=path!("/") view=MapPage/>
                    <Route path=path!("/needs/:id") view=NeedDetailPage/>
                </Routes>
            </main>
        </Router>
    }
}

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
