use leptos::*;
use shared::config::BoardConfig;
use shared::feed::{FeedContent, FeedItem};
use shared::reactions::Reactable;
use shared::ImageRef;

use super::badge::ContentBadges;
use super::like_button::LikeButton;
use super::markdown::MarkdownView;
use crate::state::server_time::use_server_time;
use crate::utils::{format_date, format_event_dates};

fn ordered_images(images: &[ImageRef]) -> Vec<ImageRef> {
    let mut images = images.to_vec();
    images.sort_by_key(|image| image.display_order.unwrap_or(i32::MAX));
    images
}

#[component]
fn ImageStrip(images: Vec<ImageRef>) -> impl IntoView {
    let config = expect_context::<BoardConfig>();
    if images.is_empty() {
        return view! {}.into_view();
    }
    view! {
        <div class="image-strip">
            {ordered_images(&images)
                .into_iter()
                .map(|image| {
                    let alt = image.file_name.clone().unwrap_or_default();
                    view! { <img src=config.asset_url(&image.file_path) alt=alt loading="lazy" /> }
                })
                .collect_view()}
        </div>
    }
    .into_view()
}

/// One announcement or calendar event in the newsfeed.
#[component]
pub fn FeedCard(item: FeedItem) -> impl IntoView {
    let time = use_server_time();
    let key = item.key();
    let alert = item.content.is_alert();

    let (reaction, date_line, body, images, author) = match &item.content {
        FeedContent::Announcement(a) => (
            a.reaction(),
            item.display_date
                .map(|d| format_date(d, time.tz()))
                .unwrap_or_else(|| a.created_at.clone()),
            a.content.clone(),
            a.attachments.clone(),
            a.author_name.clone(),
        ),
        FeedContent::Event(e) => (
            e.reaction(),
            format_event_dates(e, time.tz()),
            e.description.clone().unwrap_or_default(),
            e.images.clone(),
            None,
        ),
    };

    view! {
        <article class="card feed-card" class:feed-card-alert=alert>
            <header class="feed-card-header">
                <ContentBadges content=item.content.clone() />
                <h3 class="feed-card-title">{item.content.title().to_string()}</h3>
                <div class="feed-card-meta">
                    <span>{date_line}</span>
                    {author.map(|name| view! { <span class="feed-card-author">{name}</span> })}
                </div>
            </header>
            <MarkdownView content=body />
            <ImageStrip images=images />
            <footer class="feed-card-footer">
                <LikeButton content=key initial=reaction />
            </footer>
        </article>
    }
}
