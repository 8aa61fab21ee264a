use crate::api::post_comment;
use crate::components::error_message;
use leptos::prelude::*;
use leptos::task::spawn_local;
use neighborly_app::domain::limits::MAX_COMMENT_CHARS;
use neighborly_app::domain::Comment;
use uuid::Uuid;

#[component]
pub fn CommentComposer(
    need_id: Uuid,
    #[prop(optional)] parent_id: Option<Uuid>,
    on_posted: Callback<Comment>,
) -> impl IntoView {
    let content = RwSignal::new(String::new());
    let sending = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let remaining = move || MAX_COMMENT_CHARS as i64 - content.with(|c| c.chars().count()) as i64;
    let blank = move || content.with(|c| c.trim().is_empty());

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if sending.get_untracked() || blank() {
            return;
        }
        sending.set(true);
        let text = content.get_untracked();

        spawn_local(async move {
            let result = post_comment(need_id, parent_id, text).await;
            sending.set(false);
            match result {
                Ok(comment) => {
                    content.set(String::new());
                    error.set(None);
                    on_posted.run(comment);
                }
                Err(e) => error.set(Some(error_message(&e))),
            }
        });
    };

    let placeholder = if parent_id.is_some() { "Write a reply..." } else { "Add a comment..." };

    view! {
        <form class="composer" on:submit=submit>
            <textarea
                class="composer__input"
                placeholder=placeholder
                maxlength=MAX_COMMENT_CHARS
                prop:value=move || content.get()
                on:input=move |ev| content.set(event_target_value(&ev))
            ></textarea>
            <div class="composer__footer">
                <span class="composer__remaining" class:composer__remaining--over=move || remaining() < 0>
                    {remaining}
                </span>
                <button type="submit" class="composer__submit" disabled=move || sending.get() || blank()>
                    {move || if sending.get() { "Posting..." } else { "Post" }}
                </button>
            </div>
            {move || error.get().map(|message| view! { <p class="composer__error">{message}</p> })}
        </form>
    }
}
