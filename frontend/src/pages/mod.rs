pub mod newsfeed;
pub mod tv_control;
pub mod tv_display;
