use leptos::*;
use shared::feed::FeedContent;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum BadgeVariant {
    #[default]
    Default,
    Alert,
    Event,
    Pinned,
    Holiday,
}

impl BadgeVariant {
    fn class(self) -> &'static str {
        match self {
            BadgeVariant::Default => "badge",
            BadgeVariant::Alert => "badge badge-danger",
            BadgeVariant::Event => "badge badge-info",
            BadgeVariant::Pinned => "badge badge-warning",
            BadgeVariant::Holiday => "badge badge-success",
        }
    }
}

/// Badge/label component for status indicators.
#[component]
pub fn Badge(#[prop(optional)] variant: BadgeVariant, children: Children) -> impl IntoView {
    view! { <span class=variant.class()>{children()}</span> }
}

/// Labels describing a feed item: alert flag, kind, category and grade.
pub fn content_labels(content: &FeedContent) -> Vec<(BadgeVariant, String)> {
    let mut labels = Vec::new();
    if content.is_alert() {
        labels.push((BadgeVariant::Alert, "Alert".to_string()));
    }
    match content {
        FeedContent::Announcement(a) => {
            if a.is_pinned {
                labels.push((BadgeVariant::Pinned, "Pinned".to_string()));
            }
            if let Some(category) = &a.category_name {
                let label = match &a.subcategory_name {
                    Some(sub) => format!("{} / {}", category, sub),
                    None => category.clone(),
                };
                labels.push((BadgeVariant::Default, label));
            }
            if let Some(grade) = a.grade_level {
                labels.push((BadgeVariant::Default, format!("Grade {}", grade)));
            }
        }
        FeedContent::Event(e) => {
            labels.push((BadgeVariant::Event, "Event".to_string()));
            if e.is_holiday {
                labels.push((BadgeVariant::Holiday, "Holiday".to_string()));
            }
            if let Some(category) = &e.category_name {
                labels.push((BadgeVariant::Default, category.clone()));
            }
        }
    }
    labels
}

#[component]
pub fn ContentBadges(content: FeedContent) -> impl IntoView {
    view! {
        <div class="badge-row">
            {content_labels(&content)
                .into_iter()
                .map(|(variant, label)| view! { <Badge variant=variant>{label}</Badge> })
                .collect_view()}
        </div>
    }
}
