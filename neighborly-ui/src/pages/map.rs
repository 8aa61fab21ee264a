use crate::api::{get_current_user, list_clusters};
use crate::components::{error_message, ErrorDisplay, HeatBadge, LoadingSpinner, NeedComposer};
use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use neighborly_app::domain::cluster::hottest;
use neighborly_app::domain::{Cluster, HeatTier, NeedCategory};
use std::time::Duration;

const REFRESH_EVERY: Duration = Duration::from_secs(30);

/// Clusters of needs, hottest first, with category and keyword filters taken
/// from the query string.
#[component]
pub fn MapPage() -> impl IntoView {
    let query = use_query_map();
    let category = move || query.with(|q| q.get("category").filter(|c| !c.is_empty()));
    let search = move || query.with(|q| q.get("q").filter(|s| !s.trim().is_empty()));

    let clusters = Resource::new(
        move || (category(), search()),
        |(category, search)| list_clusters(category, search),
    );

    let user = Resource::new(|| (), |_| get_current_user());

    Effect::new(move |_| {
        if let Ok(handle) = set_interval_with_handle(move || clusters.refetch(), REFRESH_EVERY) {
            on_cleanup(move || handle.clear());
        }
    });

    view! {
        <div class="hero">
            <h1 class="hero__title">"What does the neighborhood need?"</h1>
            <p class="hero__subtitle">"Vote on what is missing nearby. The hotter the spot, the more people want it."</p>
        </div>

        <form method="get" action="/" class="filters">
            <select name="category" class="filters__category">
                <option value="">"All categories"</option>
                {NeedCategory::ALL
                    .into_iter()
                    .map(|c| view! {
                        <option value=c.label() selected=move || category().as_deref() == Some(c.label())>
                            {c.label()}
                        </option>
                    })
                    .collect_view()}
            </select>
            <input
                type="search"
                name="q"
                class="filters__search"
                placeholder="Search needs..."
                value=move || search().unwrap_or_default()
            />
            <button type="submit" class="filters__submit">"Filter"</button>
        </form>

        <Suspense fallback=|| ()>
            {move || user.get().map(|result| match result {
                Ok(Some(_)) => view! { <NeedComposer/> }.into_any(),
                _ => view! { <p class="need-composer__signin">"Sign in to put a need on the map."</p> }.into_any(),
            })}
        </Suspense>

        <HeatLegend/>

        <Transition fallback=|| view! { <LoadingSpinner text="Loading the map..."/> }>
            {move || clusters.get().map(|result| match result {
                Ok(list) if list.is_empty() => view! {
                    <p class="clusters__empty">"Nothing here yet."</p>
                }
                .into_any(),
                Ok(list) => view! {
                    <ul class="clusters">
                        {list.into_iter().map(|c| view! { <ClusterCard cluster=c/> }).collect_view()}
                    </ul>
                }
                .into_any(),
                Err(e) => view! {
                    <ErrorDisplay
                        message=error_message(&e)
                        on_retry=Callback::new(move |_| clusters.refetch())
                    />
                }
                .into_any(),
            })}
        </Transition>
    }
}

#[component]
fn ClusterCard(cluster: Cluster) -> impl IntoView {
    let headline = hottest(&cluster.needs).map(|n| n.title.clone()).unwrap_or_default();
    let size = cluster.len();
    let location = format!("{:.4}, {:.4}", cluster.center.lat, cluster.center.lng);

    view! {
        <li class="cluster" style=format!("border-color: {}", cluster.tier.color())>
            <div class="cluster__header">
                <HeatBadge tier=cluster.tier/>
                <span class="cluster__headline">{headline}</span>
                <span class="cluster__size">{format!("{size} need{}", if size == 1 { "" } else { "s" })}</span>
            </div>
            <p class="cluster__location">{location}</p>
            <ul class="cluster__needs">
                {cluster
                    .needs
                    .into_iter()
                    .map(|need| view! {
                        <li class="cluster__need">
                            <a href=format!("/needs/{}", need.id)>{need.title.clone()}</a>
                            <span class="cluster__category">{need.category.label()}</span>
                            <span class="cluster__net">{need.net()}</span>
                        </li>
                    })
                    .collect_view()}
            </ul>
        </li>
    }
}

#[component]
fn HeatLegend() -> impl IntoView {
    let tiers = [HeatTier::New, HeatTier::Noticed, HeatTier::Popular, HeatTier::Hot, HeatTier::OnFire];

    view! {
        <div class="legend">
            {tiers.into_iter().map(|tier| view! { <HeatBadge tier=tier/> }).collect_view()}
        </div>
    }
}
