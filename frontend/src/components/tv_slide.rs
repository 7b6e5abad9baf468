use leptos::*;
use shared::config::BoardConfig;
use shared::feed::FeedContent;

use super::badge::ContentBadges;
use super::markdown::MarkdownView;
use crate::utils::format_event_dates;

/// Full-screen rendering of one kiosk slide.
#[component]
pub fn TvSlide(content: FeedContent) -> impl IntoView {
    let config = expect_context::<BoardConfig>();

    let (subtitle, body, hero) = match &content {
        FeedContent::Announcement(a) => (
            a.author_name.clone().unwrap_or_default(),
            a.content.clone(),
            a.attachments.first().map(|i| config.asset_url(&i.file_path)),
        ),
        FeedContent::Event(e) => (
            format_event_dates(e, config.tz()),
            e.description.clone().unwrap_or_default(),
            e.images.first().map(|i| config.asset_url(&i.file_path)),
        ),
    };

    view! {
        <div class="tv-slide" class:tv-slide-alert=content.is_alert()>
            {hero.map(|src| view! { <img class="tv-slide-image" src=src alt="" /> })}
            <div class="tv-slide-text">
                <ContentBadges content=content.clone() />
                <h1 class="tv-slide-title">{content.title().to_string()}</h1>
                <p class="tv-slide-subtitle">{subtitle}</p>
                <MarkdownView content=body />
            </div>
        </div>
    }
}

/// Full-screen emergency override
#[component]
pub fn EmergencySlide(#[prop(into)] message: String) -> impl IntoView {
    view! {
        <div class="tv-slide tv-emergency" role="alert">
            <h1 class="tv-emergency-heading">"EMERGENCY"</h1>
            <p class="tv-emergency-message">{message}</p>
        </div>
    }
}
