use crate::components::{AppView, Icon};
use crate::db::{initialize_database, load_settings, FeedSettings};
use dioxus::prelude::*;

#[component]
pub fn AppShell() -> Element {
    let mut settings = use_signal(FeedSettings::default);
    let mut settings_loaded = use_signal(|| false);
    let current_view = use_route::<AppView>();

    use_context_provider(|| settings);

    // Initialize storage and load saved settings on mount
    use_effect(move || {
        spawn(async move {
            if let Err(err) = initialize_database().await {
                tracing::warn!(error = ?err, "settings storage unavailable, using defaults");
            } else {
                match load_settings().await {
                    Ok(saved) => settings.set(saved),
                    Err(err) => tracing::warn!(error = ?err, "could not read saved settings"),
                }
            }
            if !settings.peek().backend().is_configured() {
                tracing::warn!("no backend configured; the feed will stay empty");
            }
            settings_loaded.set(true);
        });
    });

    let title = match &current_view {
        AppView::ClipsView {} => "CivicClips".to_string(),
        AppView::HashtagClipsView { tag } => format!("#{tag}"),
        AppView::AuthorClipsView { .. } => "Creator clips".to_string(),
    };
    let is_root = matches!(current_view, AppView::ClipsView {});

    rsx! {
        div { class: "app-shell",
            header { class: "app-header",
                if !is_root {
                    Link {
                        class: "app-back",
                        to: AppView::ClipsView {},
                        "‹ All clips"
                    }
                }
                span { class: "app-title", "{title}" }
            }

            main { class: "app-main",
                if settings_loaded() {
                    Outlet::<AppView> {}
                } else {
                    div { class: "clip-feed-state",
                        Icon { name: "loader".to_string(), class: "w-8 h-8".to_string() }
                    }
                }
            }
        }
    }
}
