use crate::api::cast_vote;
use leptos::prelude::*;
use leptos::task::spawn_local;
use neighborly_app::domain::{VoteCounts, VoteDirection, VoteTarget};
use neighborly_app::session::OptimisticVotes;
use neighborly_errors::AppError;

/// Up/down buttons with a net score. The counter moves as soon as the button
/// is pressed and snaps back if the server rejects the vote.
#[component]
pub fn VoteButtons(
    target: VoteTarget,
    /// Counters as last fetched, used until this page has its own value.
    fallback: VoteCounts,
    votes: RwSignal<OptimisticVotes>,
) -> impl IntoView {
    let error = RwSignal::new(None::<String>);

    let counts = move || votes.with(|v| v.counts_or(target, fallback));
    let voted = move || votes.with(|v| v.has_voted(target));

    let cast = move |direction: VoteDirection| {
        let pending = votes
            .try_update(|v| {
                if v.counts(target).is_none() {
                    v.observe(target, fallback);
                }
                v.begin(target, direction)
            })
            .flatten();
        let Some(pending) = pending else {
            return;
        };

        spawn_local(async move {
            let result = cast_vote(
                target.kind().to_string(),
                target.id(),
                direction == VoteDirection::Up,
            )
            .await
            .map_err(|e| AppError::from_server_error(&e));

            error.set(result.as_ref().err().map(AppError::user_message));
            votes.update(|v| {
                v.settle(pending, result);
            });
        });
    };

    view! {
        <div class="votes">
            <button
                class="votes__button votes__button--up"
                disabled=voted
                title="Upvote"
                on:click=move |_| cast(VoteDirection::Up)
            >
                "▲"
            </button>
            <span class="votes__net">{move || counts().net()}</span>
            <button
                class="votes__button votes__button--down"
                disabled=voted
                title="Downvote"
                on:click=move |_| cast(VoteDirection::Down)
            >
                "▼"
            </button>
            {move || error.get().map(|message| view! { <span class="votes__error">{message}</span> })}
        </div>
    }
}
