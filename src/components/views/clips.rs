use crate::api::ClipFilters;
use crate::components::ClipFeed;
use dioxus::prelude::*;

#[component]
pub fn ClipsView() -> Element {
    rsx! {
        ClipFeed { filters: ClipFilters::default(), show_tabs: true }
    }
}

#[component]
pub fn HashtagClipsView(tag: String) -> Element {
    let filters = ClipFilters::hashtag(tag.clone());
    rsx! {
        ClipFeed { key: "tag-{tag}", filters, show_tabs: false }
    }
}

#[component]
pub fn AuthorClipsView(author_id: String) -> Element {
    let filters = ClipFilters::author(author_id.clone());
    rsx! {
        ClipFeed { key: "author-{author_id}", filters, show_tabs: false }
    }
}
