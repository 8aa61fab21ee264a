use crate::api::{get_current_user, get_need, list_comments};
use crate::components::{
    error_message, CommentComposer, CommentThread, ErrorDisplay, HeatBadge, LoadingSpinner, ReportButton,
    VoteButtons,
};
use leptos::prelude::*;
use leptos_router::hooks::use_params_map;
use neighborly_app::domain::{Comment, ContentRef, HeatTier, Need, VoteTarget, Viewer};
use neighborly_app::session::{OptimisticVotes, ThreadView};
use uuid::Uuid;

#[component]
pub fn NeedDetailPage() -> impl IntoView {
    let params = use_params_map();
    let id = move || params.with(|p| p.get("id").and_then(|raw| Uuid::parse_str(&raw).ok()));

    view! {
        {move || match id() {
            Some(id) => view! { <NeedDetail id=id/> }.into_any(),
            None => view! { <ErrorDisplay message="That need does not exist."/> }.into_any(),
        }}
    }
}

#[component]
fn NeedDetail(id: Uuid) -> impl IntoView {
    let need = Resource::new(move || id, get_need);
    let comments = Resource::new(move || id, list_comments);
    let user = Resource::new(|| (), |_| get_current_user());

    let votes = RwSignal::new(OptimisticVotes::new());
    let thread = RwSignal::new(ThreadView::new());

    // Fresh counters from the server replace what this page shows, except
    // for votes that are still on their way.
    Effect::new(move |_| {
        if let Some(Ok(n)) = need.get() {
            votes.update(|v| v.observe(VoteTarget::Need(n.id), n.counts()));
        }
    });
    Effect::new(move |_| {
        if let Some(Ok(list)) = comments.get() {
            votes.update(|v| {
                for c in &list {
                    v.observe(VoteTarget::Comment(c.id), c.counts());
                }
            });
        }
    });

    let refetch_comments = Callback::new(move |_: ()| comments.refetch());

    view! {
        <a href="/" class="back">"← Back to the map"</a>
        <Suspense fallback=|| view! { <LoadingSpinner/> }>
            {move || need.get().map(|result| match result {
                Ok(n) => view! { <NeedSummary need=n votes=votes/> }.into_any(),
                Err(e) => view! { <ErrorDisplay message=error_message(&e)/> }.into_any(),
            })}
        </Suspense>

        <Suspense fallback=|| view! { <LoadingSpinner text="Loading comments..."/> }>
            {move || {
                let viewer = match user.get() {
                    Some(Ok(u)) => u.map(Viewer::signed_in).unwrap_or_default(),
                    Some(Err(_)) => Viewer::anonymous(),
                    None => return None,
                };
                comments.get().map(|result| match result {
                    Ok(list) => view! {
                        <Comments
                            need_id=id
                            comments=list
                            viewer=viewer
                            votes=votes
                            thread=thread
                            on_change=refetch_comments
                        />
                    }
                    .into_any(),
                    Err(e) => view! {
                        <ErrorDisplay message=error_message(&e) on_retry=refetch_comments/>
                    }
                    .into_any(),
                })
            }}
        </Suspense>
    }
}

#[component]
fn NeedSummary(need: Need, votes: RwSignal<OptimisticVotes>) -> impl IntoView {
    let target = VoteTarget::Need(need.id);
    let fetched = need.counts();
    let tier = Signal::derive(move || HeatTier::from_net(votes.with(|v| v.counts_or(target, fetched)).net()));

    view! {
        <article class="need">
            <header class="need__header">
                <h1 class="need__title">{need.title.clone()}</h1>
                <HeatBadge tier=tier/>
            </header>
            <p class="need__meta">
                <span class="need__category">{need.category.label()}</span>
                " · "
                <span class="need__location">{format!("{:.4}, {:.4}", need.latitude, need.longitude)}</span>
                " · "
                <time class="need__time">{need.created_at.format("%b %-d, %Y").to_string()}</time>
            </p>
            {need.description.clone().map(|d| view! { <p class="need__description">{d}</p> })}
            <div class="need__actions">
                <VoteButtons target=target fallback=fetched votes=votes/>
                <ReportButton target=ContentRef::Need(need.id)/>
            </div>
        </article>
    }
}

#[component]
fn Comments(
    need_id: Uuid,
    comments: Vec<Comment>,
    viewer: Viewer,
    votes: RwSignal<OptimisticVotes>,
    thread: RwSignal<ThreadView>,
    on_change: Callback<()>,
) -> impl IntoView {
    let signed_in = viewer.is_signed_in();
    let on_posted = Callback::new(move |_: Comment| on_change.run(()));

    view! {
        {if signed_in {
            view! { <CommentComposer need_id=need_id on_posted=on_posted/> }.into_any()
        } else {
            view! { <p class="thread__signin">"Sign in to join the conversation."</p> }.into_any()
        }}
        <CommentThread
            need_id=need_id
            comments=comments
            viewer=viewer
            votes=votes
            thread=thread
            on_change=on_change
        />
    }
}
