use crate::utils::CATEGORY_TABS;
use dioxus::prelude::*;

#[component]
pub fn CategoryTabs(active: String, on_select: EventHandler<&'static str>) -> Element {
    rsx! {
        nav { class: "clip-tabs", role: "tablist",
            for tab in CATEGORY_TABS {
                button {
                    key: "{tab.key}",
                    role: "tab",
                    class: if tab.key == active { "clip-tab active {tab.accent}" } else { "clip-tab" },
                    aria_selected: if tab.key == active { "true" } else { "false" },
                    onclick: move |_| on_select.call(tab.key),
                    "{tab.label}"
                }
            }
        }
    }
}
