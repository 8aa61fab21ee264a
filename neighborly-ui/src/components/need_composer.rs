use crate::api::create_need;
use crate::components::error_message;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use neighborly_app::domain::limits::{MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};
use neighborly_app::domain::NeedCategory;
use neighborly_app::session::NeedDraft;

/// Form for putting a new need on the map. Opens the need's page once it is
/// posted.
#[component]
pub fn NeedComposer() -> impl IntoView {
    let draft = RwSignal::new(NeedDraft {
        category: NeedCategory::Other.label().to_string(),
        ..NeedDraft::default()
    });
    let sending = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let navigate = use_navigate();

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if sending.get_untracked() {
            return;
        }
        let input = match draft.with_untracked(NeedDraft::to_input) {
            Ok(input) => input,
            Err(e) => {
                error.set(Some(e.user_message()));
                return;
            }
        };
        sending.set(true);

        let navigate = navigate.clone();
        spawn_local(async move {
            let result = create_need(input).await;
            sending.set(false);
            match result {
                Ok(need) => {
                    error.set(None);
                    draft.set(NeedDraft::default());
                    navigate(&format!("/needs/{}", need.id), Default::default());
                }
                Err(e) => error.set(Some(error_message(&e))),
            }
        });
    };

    view! {
        <form class="need-composer" on:submit=submit>
            <h2 class="need-composer__title">"Something missing nearby?"</h2>
            <select
                class="need-composer__category"
                on:change=move |ev| draft.update(|d| d.category = event_target_value(&ev))
            >
                {NeedCategory::ALL
                    .into_iter()
                    .map(|c| view! {
                        <option value=c.label() selected=move || draft.with(|d| d.category == c.label())>
                            {c.label()}
                        </option>
                    })
                    .collect_view()}
            </select>
            <input
                type="text"
                class="need-composer__name"
                placeholder="What is needed?"
                maxlength=MAX_TITLE_CHARS
                required
                prop:value=move || draft.with(|d| d.title.clone())
                on:input=move |ev| draft.update(|d| d.title = event_target_value(&ev))
            />
            <textarea
                class="need-composer__description"
                placeholder="Why does the neighborhood need it? (optional)"
                maxlength=MAX_DESCRIPTION_CHARS
                prop:value=move || draft.with(|d| d.description.clone())
                on:input=move |ev| draft.update(|d| d.description = event_target_value(&ev))
            ></textarea>
            <div class="need-composer__coords">
                <input
                    type="text"
                    inputmode="decimal"
                    class="need-composer__lat"
                    placeholder="Latitude"
                    required
                    prop:value=move || draft.with(|d| d.latitude.clone())
                    on:input=move |ev| draft.update(|d| d.latitude = event_target_value(&ev))
                />
                <input
                    type="text"
                    inputmode="decimal"
                    class="need-composer__lng"
                    placeholder="Longitude"
                    required
                    prop:value=move || draft.with(|d| d.longitude.clone())
                    on:input=move |ev| draft.update(|d| d.longitude = event_target_value(&ev))
                />
            </div>
            <button
                type="submit"
                class="need-composer__submit"
                disabled=move || sending.get() || draft.with(NeedDraft::is_blank)
            >
                {move || if sending.get() { "Posting..." } else { "Post need" }}
            </button>
            {move || error.get().map(|message| view! { <p class="need-composer__error">{message}</p> })}
        </form>
    }
}
