use leptos::*;

/// Previous/next pager for 1-based pages
#[component]
pub fn Pagination(
    page: RwSignal<usize>,
    #[prop(into)] total_pages: Signal<usize>,
) -> impl IntoView {
    view! {
        <Show when=move || { total_pages.get() > 1 }>
            <nav class="pagination">
                <button
                    class="btn btn-outline"
                    disabled=move || { page.get() <= 1 }
                    on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
                >
                    "Previous"
                </button>
                <span class="pagination-status">
                    {move || format!("Page {} of {}", page.get(), total_pages.get())}
                </span>
                <button
                    class="btn btn-outline"
                    disabled=move || { page.get() >= total_pages.get() }
                    on:click=move |_| page.update(|p| *p = (*p + 1).min(total_pages.get_untracked()))
                >
                    "Next"
                </button>
            </nav>
        </Show>
    }
}
