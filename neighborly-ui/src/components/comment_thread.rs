use crate::api::delete_comment;
use crate::components::{error_message, CommentComposer, ReportButton, VoteButtons};
use leptos::prelude::*;
use leptos::task::spawn_local;
use neighborly_app::domain::{Comment, CommentTree, ContentRef, VoteTarget, Viewer};
use neighborly_app::session::{OptimisticVotes, ThreadRow, ThreadView};
use uuid::Uuid;

const INDENT_REM: usize = 2;

/// Nested comments under a need. Collapse state lives in `thread` so it
/// survives a refetch of `comments`.
#[component]
pub fn CommentThread(
    need_id: Uuid,
    comments: Vec<Comment>,
    viewer: Viewer,
    votes: RwSignal<OptimisticVotes>,
    thread: RwSignal<ThreadView>,
    /// Called after a reply or delete so the caller can refetch.
    on_change: Callback<()>,
) -> impl IntoView {
    let tree = CommentTree::build(&comments);
    thread.update_untracked(|t| t.retain(&tree));

    let total = tree.len();
    let tree = StoredValue::new(tree);
    let replying_to = RwSignal::new(None::<Uuid>);
    let error = RwSignal::new(None::<String>);

    let rows = move || {
        thread.with(|t| votes.with(|v| tree.with_value(|tree| t.render(tree, &viewer, v))))
    };

    let remove = move |id: Uuid| {
        spawn_local(async move {
            match delete_comment(id).await {
                Ok(()) => {
                    error.set(None);
                    on_change.run(());
                }
                Err(e) => error.set(Some(error_message(&e))),
            }
        });
    };

    view! {
        <section class="thread">
            <div class="thread__header">
                <h3 class="thread__title">{format!("Comments ({total})")}</h3>
                <button class="thread__expand" on:click=move |_| thread.update(ThreadView::expand_all)>
                    "Expand all"
                </button>
            </div>
            {move || error.get().map(|message| view! { <p class="thread__error">{message}</p> })}
            {move || {
                if total == 0 {
                    return view! { <p class="thread__empty">"No comments yet."</p> }.into_any();
                }
                rows()
                    .into_iter()
                    .map(|row| view! {
                        <CommentRow
                            row=row
                            need_id=need_id
                            votes=votes
                            thread=thread
                            replying_to=replying_to
                            on_delete=Callback::new(remove)
                            on_change=on_change
                        />
                    })
                    .collect_view()
                    .into_any()
            }}
        </section>
    }
}

#[component]
fn CommentRow(
    row: ThreadRow,
    need_id: Uuid,
    votes: RwSignal<OptimisticVotes>,
    thread: RwSignal<ThreadView>,
    replying_to: RwSignal<Option<Uuid>>,
    on_delete: Callback<Uuid>,
    on_change: Callback<()>,
) -> impl IntoView {
    let id = row.comment.id;
    let hidden = row.hidden_label();
    let has_replies = row.reply_count > 0;
    let posted = row.comment.created_at.format("%b %-d, %H:%M").to_string();
    let actions = row.actions;
    let collapsed = row.collapsed;
    let fallback = row.comment.counts();

    let on_posted = Callback::new(move |_: Comment| {
        replying_to.set(None);
        on_change.run(());
    });

    view! {
        <article class="comment" style=format!("margin-left: {}rem", row.indent * INDENT_REM)>
            <div class="comment__meta">
                {has_replies.then(|| view! {
                    <button class="comment__toggle" on:click=move |_| thread.update(|t| t.toggle(id))>
                        {if collapsed { "[+]" } else { "[-]" }}
                    </button>
                })}
                <time class="comment__time">{posted}</time>
            </div>
            {row.body().map(|body| view! { <p class="comment__body">{body.to_string()}</p> })}
            {(!collapsed).then(|| view! {
                <div class="comment__actions">
                    <VoteButtons target=VoteTarget::Comment(id) fallback=fallback votes=votes/>
                    {actions.can_reply.then(|| view! {
                        <button class="comment__reply" on:click=move |_| {
                            replying_to.update(|r| *r = if *r == Some(id) { None } else { Some(id) })
                        }>
                            "Reply"
                        </button>
                    })}
                    {actions.can_delete.then(|| view! {
                        <button class="comment__delete" on:click=move |_| on_delete.run(id)>"Delete"</button>
                    })}
                    <ReportButton target=ContentRef::Comment(id)/>
                </div>
            })}
            {hidden.map(|label| view! { <p class="comment__hidden">{label}</p> })}
            {move || (!collapsed && replying_to.get() == Some(id)).then(|| view! {
                <CommentComposer need_id=need_id parent_id=id on_posted=on_posted/>
            })}
        </article>
    }
}
