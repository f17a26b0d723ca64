//! Routes for the clip feeds.

use crate::components::views::{AuthorClipsView, ClipsView, HashtagClipsView};
use crate::components::AppShell;
use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum AppView {
    #[layout(AppShell)]
        #[route("/")]
        ClipsView {},
        #[route("/tag/:tag")]
        HashtagClipsView { tag: String },
        #[route("/u/:author_id")]
        AuthorClipsView { author_id: String },
}
