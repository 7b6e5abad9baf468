pub mod badge;
pub mod emergency_panel;
pub mod feed_card;
pub mod feed_filters;
pub mod like_button;
pub mod loading;
pub mod markdown;
pub mod navbar;
pub mod pagination;
pub mod source_error;
pub mod tv_slide;
