use leptos::prelude::*;
use neighborly_app::domain::HeatTier;

#[component]
pub fn HeatBadge(#[prop(into)] tier: Signal<HeatTier>) -> impl IntoView {
    view! {
        <span
            class="heat"
            style=move || format!("background-color: {}", tier.get().color())
            title=move || format!("Tier {}", tier.get().level())
        >
            {move || tier.get().label()}
        </span>
    }
}
