use leptos::*;
use shared::feed::FeedFilter;

/// A category the user can filter on, as seen in the loaded content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CategoryOption {
    pub id: i64,
    pub name: String,
}

fn parse_optional<T: std::str::FromStr>(value: &str) -> Option<T> {
    if value.is_empty() {
        None
    } else {
        value.parse().ok()
    }
}

/// Search box plus category and grade selects bound to one filter signal.
#[component]
pub fn FeedFilters(
    filter: RwSignal<FeedFilter>,
    #[prop(into)] categories: Signal<Vec<CategoryOption>>,
    #[prop(into)] grades: Signal<Vec<i32>>,
) -> impl IntoView {
    view! {
        <div class="feed-filters">
            <input
                type="search"
                class="form-input"
                placeholder="Search announcements and events"
                prop:value=move || filter.with(|f| f.search_term.clone())
                on:input=move |ev| {
                    let term = event_target_value(&ev);
                    filter.update(|f| f.search_term = term);
                }
            />
            <select
                class="form-select"
                on:change=move |ev| {
                    let category_id = parse_optional(&event_target_value(&ev));
                    filter.update(|f| f.category_id = category_id);
                }
            >
                <option value="" selected=move || filter.with(|f| f.category_id.is_none())>
                    "All categories"
                </option>
                {move || {
                    categories
                        .get()
                        .into_iter()
                        .map(|category| {
                            let id = category.id;
                            view! {
                                <option
                                    value=id.to_string()
                                    selected=move || filter.with(|f| f.category_id == Some(id))
                                >
                                    {category.name}
                                </option>
                            }
                        })
                        .collect_view()
                }}
            </select>
            <select
                class="form-select"
                on:change=move |ev| {
                    let grade_level = parse_optional(&event_target_value(&ev));
                    filter.update(|f| f.grade_level = grade_level);
                }
            >
                <option value="" selected=move || filter.with(|f| f.grade_level.is_none())>
                    "All grades"
                </option>
                {move || {
                    grades
                        .get()
                        .into_iter()
                        .map(|grade| {
                            view! {
                                <option
                                    value=grade.to_string()
                                    selected=move || filter.with(|f| f.grade_level == Some(grade))
                                >
                                    {format!("Grade {}", grade)}
                                </option>
                            }
                        })
                        .collect_view()
                }}
            </select>
            <button class="btn btn-outline" on:click=move |_| filter.set(FeedFilter::default())>
                "Clear filters"
            </button>
        </div>
    }
}
