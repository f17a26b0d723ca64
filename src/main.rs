use dioxus::prelude::*;

mod api;
mod components;
mod db;
mod diagnostics;
mod feed;
mod player;
mod utils;

use components::AppView;

const FEED_CSS: Asset = asset!("/assets/styling/feed.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Meta { name: "viewport", content: "width=device-width, initial-scale=1, viewport-fit=cover" }
        document::Meta { name: "theme-color", content: "#0b0f17" }
        document::Meta { name: "mobile-web-app-capable", content: "yes" }
        document::Meta { name: "apple-mobile-web-app-title", content: "CivicClips" }

        document::Stylesheet { href: FEED_CSS }

        Router::<AppView> {}
    }
}
