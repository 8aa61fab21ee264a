use crate::api::{dev_login_enabled, get_current_user};
use leptos::prelude::*;

/// Signed-in user with a logout button, or the sign-in form when the
/// deployment offers local sign-in.
#[component]
pub fn AuthBar() -> impl IntoView {
    let user = Resource::new(|| (), |_| get_current_user());
    let dev_login = Resource::new(|| (), |_| dev_login_enabled());

    view! {
        <div class="auth">
            <Suspense fallback=|| ()>
                {move || user.get().map(|result| match result {
                    Ok(Some(user)) => view! {
                        <div class="auth__user">
                            {user.avatar_url.clone().map(|src| view! {
                                <img class="auth__avatar" src=src alt=""/>
                            })}
                            <span class="auth__name">{user.full_name.clone()}</span>
                            <form action="/auth/logout" method="post">
                                <button type="submit" class="auth__logout">"Sign out"</button>
                            </form>
                        </div>
                    }
                    .into_any(),
                    Ok(None) if dev_login.get().and_then(Result::ok).unwrap_or(false) => view! {
                        <form action="/auth/dev-login" method="post" class="auth__login">
                            <input type="text" name="name" class="auth__input" placeholder="Your name" required/>
                            <button type="submit" class="auth__submit">"Sign in"</button>
                        </form>
                    }
                    .into_any(),
                    Ok(None) => view! { <span class="auth__guest">"Browsing as a guest"</span> }.into_any(),
                    Err(_) => view! { <span class="auth__error">"Could not load your account"</span> }.into_any(),
                })}
            </Suspense>
        </div>
    }
}
