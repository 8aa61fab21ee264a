use crate::api::file_report;
use crate::components::error_message;
use leptos::prelude::*;
use leptos::task::spawn_local;
use neighborly_app::domain::limits::MAX_REPORT_NOTE_CHARS;
use neighborly_app::domain::{ContentRef, ReportReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Closed,
    Open,
    Sent,
}

/// "Report" link that unfolds into a reason picker with an optional note.
#[component]
pub fn ReportButton(target: ContentRef) -> impl IntoView {
    let stage = RwSignal::new(Stage::Closed);
    let reason = RwSignal::new(ReportReason::InappropriateContent);
    let note = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let note = note.get_untracked();
        let note = (!note.trim().is_empty()).then_some(note);
        let reason = reason.get_untracked().label().to_string();

        spawn_local(async move {
            match file_report(target.kind().to_string(), target.id(), reason, note).await {
                Ok(()) => {
                    error.set(None);
                    stage.set(Stage::Sent);
                }
                Err(e) => error.set(Some(error_message(&e))),
            }
        });
    };

    view! {
        <div class="report">
            {move || match stage.get() {
                Stage::Closed => view! {
                    <button class="report__toggle" on:click=move |_| stage.set(Stage::Open)>
                        "Report"
                    </button>
                }
                .into_any(),
                Stage::Sent => view! {
                    <span class="report__sent">"Thanks, a moderator will take a look."</span>
                }
                .into_any(),
                Stage::Open => view! {
                    <form class="report__form" on:submit=submit>
                        <select
                            class="report__reason"
                            on:change=move |ev| {
                                if let Some(r) = ReportReason::parse(&event_target_value(&ev)) {
                                    reason.set(r);
                                }
                            }
                        >
                            {ReportReason::ALL
                                .into_iter()
                                .map(|r| view! {
                                    <option value=r.label() selected=move || reason.get() == r>
                                        {r.label()}
                                    </option>
                                })
                                .collect_view()}
                        </select>
                        <textarea
                            class="report__note"
                            placeholder="Anything else we should know? (optional)"
                            maxlength=MAX_REPORT_NOTE_CHARS
                            prop:value=move || note.get()
                            on:input=move |ev| note.set(event_target_value(&ev))
                        ></textarea>
                        <div class="report__actions">
                            <button type="submit" class="report__submit">"Send report"</button>
                            <button type="button" class="report__cancel" on:click=move |_| stage.set(Stage::Closed)>
                                "Cancel"
                            </button>
                        </div>
                        {move || error.get().map(|message| view! { <p class="report__error">{message}</p> })}
                    </form>
                }
                .into_any(),
            }}
        </div>
    }
}
