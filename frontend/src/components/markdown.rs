use leptos::*;
use pulldown_cmark::{html, Event, Parser};

/// Render markdown to HTML. Raw HTML in the source is shown as text rather
/// than injected into the page.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new(source).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Announcement or event body
#[component]
pub fn MarkdownView(content: String) -> impl IntoView {
    view! {
        <div class="markdown-content" inner_html=render_markdown(&content)></div>
    }
}
