//! The components module contains all shared components for our app.

mod app;
mod app_view;
mod category_tabs;
mod clip_card;
mod clip_feed;
mod clip_player;
mod feed_context;
mod icons;
pub mod media_bridge;
mod views;

pub use app::*;
pub use app_view::*;
pub use category_tabs::*;
pub use clip_card::*;
pub use clip_feed::*;
pub use clip_player::*;
pub use feed_context::*;
pub use icons::*;
// Views are accessed via views::ViewName
