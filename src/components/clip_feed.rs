use crate::api::{ClipFilters, SupabaseClient};
use crate::components::media_bridge::{delay_ms, read_feed_geometry, FEED_SCROLL_ID, FEED_SENTINEL_ID};
use crate::components::{
    ActiveClipSignal, CategoryTabs, ClipCard, FeedServices, Icon, PageVisibleSignal,
    PreloadedClips,
};
use crate::db::{save_settings, FeedSettings};
use crate::diagnostics::{log_perf, now_ms};
use crate::feed::viewport::{sync_preloaded, VIEWPORT_POLL_MS};
use crate::feed::{fetch_page, ActiveClipTracker, ClipFeedController, ViewportTracker};
use crate::player::MuteBroadcastState;
use crate::utils::tab_for_key;
use dioxus::prelude::*;
use std::collections::HashSet;
use std::rc::Rc;

/// Asks the controller for a page and runs the fetch if it agrees.
fn request_page(
    mut controller: Signal<ClipFeedController>,
    backend: Rc<SupabaseClient>,
    sentinel_visible: bool,
) {
    let Some(request) = controller.write().begin_fetch(sentinel_visible) else {
        return;
    };
    spawn(async move {
        let started = now_ms();
        let result = fetch_page(backend.as_ref(), request.cursor, &request.filters).await;
        log_perf("clip page", started, &format!("cursor={}", request.cursor));
        controller.write().complete_fetch(&request, result);
    });
}

#[component]
pub fn ClipFeed(filters: ClipFilters, show_tabs: bool) -> Element {
    let settings = use_context::<Signal<FeedSettings>>();
    let services = use_hook(|| FeedServices::from_settings(&settings.peek()));
    let mute = use_hook(|| MuteBroadcastState::new(settings.peek().start_muted));

    let controller = use_signal(|| ClipFeedController::new(filters.clone()));
    let mut active_clip = use_signal(|| None::<String>);
    let mut page_visible = use_signal(|| true);
    let mut preloaded = use_signal(HashSet::<String>::new);
    let mut active_tab = use_signal(|| "for-you".to_string());

    use_context_provider(|| services.clone());
    use_context_provider(|| mute.clone());
    use_context_provider(|| ActiveClipSignal(active_clip));
    use_context_provider(|| PageVisibleSignal(page_visible));
    use_context_provider(|| PreloadedClips(preloaded));

    // First page on mount.
    {
        let backend = services.backend.clone();
        use_effect(move || request_page(controller, backend.clone(), true));
    }

    // Remember the last mute choice for the next session.
    {
        let mute = mute.clone();
        let mut settings = settings;
        use_effect(move || {
            let mut receiver = mute.subscribe();
            spawn(async move {
                while receiver.changed().await.is_ok() {
                    let muted = *receiver.borrow_and_update();
                    settings.write().start_muted = muted;
                    let snapshot = settings.peek().clone();
                    if let Err(err) = save_settings(snapshot).await {
                        tracing::warn!(error = ?err, "could not persist mute preference");
                    }
                }
            });
        });
    }

    // Viewport sampling drives the active clip, preloading and pagination.
    {
        let backend = services.backend.clone();
        let margin = services.preload_margin;
        use_effect(move || {
            let backend = backend.clone();
            spawn(async move {
                let mut viewport = ViewportTracker::new();
                let mut tracker = ActiveClipTracker::new();
                loop {
                    delay_ms(VIEWPORT_POLL_MS).await;
                    let Some(geometry) = read_feed_geometry().await else {
                        continue;
                    };
                    let snapshot = geometry.snapshot(margin);
                    let changes = viewport.observe(&snapshot);

                    for card in &snapshot.cards {
                        tracker.mount(&card.id);
                    }
                    for id in &changes.unmounted {
                        tracker.unmount(id);
                    }
                    tracker.observe(&changes.crossings);
                    if active_clip.peek().as_deref() != tracker.active() {
                        active_clip.set(tracker.active().map(str::to_string));
                    }

                    if let Some(visible) = changes.page_visible {
                        page_visible.set(visible);
                    }

                    let mut next = preloaded.peek().clone();
                    let changed = {
                        let feed = controller.peek();
                        let active = tracker.active().and_then(|id| feed.index_of(id));
                        let mounted: HashSet<&str> = feed.clips()[feed.mount_window(active)]
                            .iter()
                            .map(|clip| clip.id.as_str())
                            .collect();
                        sync_preloaded(&mut viewport, &mut next, &changes, &mounted)
                    };
                    if changed {
                        preloaded.set(next);
                    }

                    request_page(controller, backend.clone(), snapshot.sentinel_visible);
                }
            });
        });
    }

    let on_tab_select = {
        let backend = services.backend.clone();
        let mut controller = controller;
        move |key: &'static str| {
            if *active_tab.peek() == key {
                return;
            }
            active_tab.set(key.to_string());
            // Tabs only swap the category; route filters stay.
            let filters = ClipFilters {
                category: tab_for_key(key).category.map(str::to_string),
                ..controller.peek().filters().clone()
            };
            controller.write().reset(filters);
            active_clip.set(None);
            let _ = document::eval(&format!(
                "const el = document.getElementById('{FEED_SCROLL_ID}'); if (el) el.scrollTop = 0;"
            ));
            request_page(controller, backend.clone(), true);
        }
    };

    let on_retry = {
        let backend = services.backend.clone();
        let mut controller = controller;
        move |_: MouseEvent| {
            controller.write().retry();
            request_page(controller, backend.clone(), true);
        }
    };

    let feed = controller.read();
    let active_index = active_clip
        .read()
        .as_deref()
        .and_then(|id| feed.index_of(id));
    let window = feed.mount_window(active_index);
    let loading = feed.is_loading();
    let loaded_once = feed.loaded_once();
    let error = feed.last_error().map(str::to_string);
    let has_error = error.is_some();
    let has_more = feed.has_more();
    let is_empty = feed.is_empty();

    rsx! {
        div { class: "clip-feed",
            if show_tabs {
                CategoryTabs { active: active_tab(), on_select: on_tab_select }
            }

            div { id: FEED_SCROLL_ID, class: "clip-feed-scroll",
                if is_empty {
                    if !loaded_once || loading {
                        div { class: "clip-feed-state",
                            Icon { name: "loader".to_string(), class: "w-8 h-8".to_string() }
                        }
                    } else if !has_error {
                        div { class: "clip-feed-state",
                            h3 { "No CivicClips yet" }
                            p { "Be the first to share a short civic update." }
                        }
                    }
                }

                for (index , clip) in feed.clips().iter().enumerate() {
                    ClipCard {
                        key: "{clip.id}",
                        clip: Rc::clone(clip),
                        mounted: window.contains(&index),
                    }
                }

                if let Some(error) = error {
                    div { class: "clip-feed-error", role: "alert",
                        Icon { name: "alert".to_string(), class: "w-5 h-5".to_string() }
                        span { "Couldn't load clips: {error}" }
                        button {
                            class: "clip-feed-retry",
                            disabled: loading,
                            onclick: on_retry,
                            "Try again"
                        }
                    }
                }

                div { id: FEED_SENTINEL_ID, class: "clip-feed-sentinel",
                    if loading && loaded_once {
                        Icon { name: "loader".to_string(), class: "w-6 h-6".to_string() }
                    } else if !has_more && loaded_once && !has_error {
                        span { class: "clip-feed-end", "You're all caught up" }
                    }
                }
            }
        }
    }
}
