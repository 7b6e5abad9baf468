use leptos::*;
use shared::reactions::ReactionState;
use shared::ContentKey;

use crate::api::AuthState;
use crate::state::reactions::use_reactions;

fn like_label(state: ReactionState) -> String {
    let heart = if state.liked { "♥" } else { "♡" };
    format!("{} {}", heart, state.count)
}

/// Like toggle. `initial` is the item's server-side state, used until the
/// reaction store has an entry for it.
#[component]
pub fn LikeButton(content: ContentKey, initial: ReactionState) -> impl IntoView {
    let reactions = use_reactions();
    let auth = expect_context::<AuthState>();

    let current = {
        let reactions = reactions.clone();
        move || reactions.state(content).unwrap_or(initial)
    };
    let pending = {
        let reactions = reactions.clone();
        move || reactions.is_pending(content)
    };
    let on_click = {
        let current = current.clone();
        move |_| reactions.toggle(content, current().liked)
    };
    let label = current.clone();

    view! {
        <button
            class="btn btn-like"
            class:liked=move || current().liked
            disabled=move || pending() || !auth.is_authenticated()
            on:click=on_click
        >
            {move || like_label(label())}
        </button>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_like_label() {
        assert_eq!(like_label(ReactionState { liked: true, count: 3 }), "♥ 3");
        assert_eq!(like_label(ReactionState { liked: false, count: 0 }), "♡ 0");
    }
}
