use crate::api::Clip;
use crate::components::media_bridge::{card_dom_id, share_post};
use crate::components::{AppView, ClipPlayer, FeedServices, Icon};
use crate::feed::engagement::persist;
use crate::feed::EngagementState;
use crate::utils::{
    accountability_badges, category_badge_class, format_category, format_count, time_ago,
};
use dioxus::prelude::*;
use std::rc::Rc;

const VISIBLE_HASHTAGS: usize = 3;

/// One full-height card. Cards outside the mount window keep their size but
/// render only the thumbnail, so their player session is dropped.
#[component]
pub fn ClipCard(clip: Rc<Clip>, mounted: bool) -> Element {
    let services = use_context::<FeedServices>();
    let mut engagement = use_signal(|| EngagementState::for_clip(&clip));

    let on_like = {
        let services = services.clone();
        let clip_id = clip.id.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            let Some(mutation) = engagement
                .write()
                .toggle_like(services.user_id.as_deref(), &clip_id)
            else {
                tracing::debug!("like ignored while signed out");
                return;
            };
            let backend = services.backend.clone();
            spawn(async move {
                persist(backend.as_ref(), mutation).await;
            });
        }
    };

    let on_save = {
        let services = services.clone();
        let clip_id = clip.id.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            let Some(mutation) = engagement
                .write()
                .toggle_save(services.user_id.as_deref(), &clip_id)
            else {
                tracing::debug!("save ignored while signed out");
                return;
            };
            let backend = services.backend.clone();
            spawn(async move {
                persist(backend.as_ref(), mutation).await;
            });
        }
    };

    let on_share = {
        let post_id = clip.post_id().map(str::to_string);
        let title = clip
            .post
            .as_ref()
            .map(|post| post.title.clone())
            .unwrap_or_default();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            let Some(post_id) = post_id.clone() else {
                return;
            };
            let title = title.clone();
            spawn(async move {
                share_post(&post_id, &title).await;
            });
        }
    };

    let state = engagement();
    let post = clip.post.clone().unwrap_or_default();
    let author = post.author.clone().unwrap_or_default();
    let author_name = author
        .display_name
        .clone()
        .or_else(|| author.username.clone())
        .unwrap_or_else(|| "Anonymous".to_string());
    let avatar_initial = author_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default();
    let community = post
        .community
        .as_ref()
        .map(|c| c.display_name.clone().unwrap_or_else(|| c.name.clone()));
    let posted = post
        .created_at
        .as_deref()
        .or(clip.created_at.as_deref())
        .and_then(|created| time_ago(created, chrono::Utc::now()));
    let category = clip.category.clone().unwrap_or_default();
    let (hashtags, hidden_tags) = clip.visible_hashtags(VISIBLE_HASHTAGS);
    let hashtags = hashtags.to_vec();
    let badges = if services.show_accountability {
        accountability_badges(
            clip.fact_check_status.as_deref(),
            clip.official_response_status.as_deref(),
            clip.has_sources,
        )
    } else {
        Vec::new()
    };
    let thumbnail = clip.thumbnail_url.clone().unwrap_or_default();
    let text = post.text.clone().unwrap_or_default();

    rsx! {
        section {
            id: "{card_dom_id(&clip.id)}",
            class: "clip-card",
            "data-clip-id": "{clip.id}",

            if mounted {
                ClipPlayer { clip: clip.clone() }
            } else {
                div { class: "clip-placeholder",
                    if !thumbnail.is_empty() {
                        img { src: "{thumbnail}", alt: "", loading: "lazy" }
                    }
                }
            }

            div { class: "clip-overlay",
                div { class: "clip-badges",
                    if !category.is_empty() {
                        span { class: "clip-badge {category_badge_class(&category)}",
                            "{format_category(&category)}"
                        }
                    }
                    span { class: "clip-views",
                        Icon { name: "eye".to_string(), class: "w-4 h-4".to_string() }
                        "{format_count(clip.views_count)}"
                    }
                    for (label , tone) in badges {
                        span { key: "{label}", class: "clip-badge {tone}", "{label}" }
                    }
                }

                div { class: "clip-meta",
                    if author.id.is_empty() {
                        span { class: "clip-author",
                            span { class: "clip-avatar clip-avatar-fallback", "{avatar_initial}" }
                            span { class: "clip-author-name", "{author_name}" }
                        }
                    } else {
                        Link {
                            class: "clip-author",
                            to: AppView::AuthorClipsView {
                                author_id: author.id.clone(),
                            },
                            if let Some(avatar) = author.avatar_url.clone() {
                                img { class: "clip-avatar", src: "{avatar}", alt: "" }
                            } else {
                                span { class: "clip-avatar clip-avatar-fallback", "{avatar_initial}" }
                            }
                            span { class: "clip-author-name", "{author_name}" }
                        }
                    }
                    if let Some(community) = community {
                        span { class: "clip-community", "c/{community}" }
                    }
                    if let Some(posted) = posted {
                        span { class: "clip-posted", "{posted}" }
                    }
                    if !post.title.is_empty() {
                        h3 { class: "clip-title", "{post.title}" }
                    }
                    if !text.is_empty() {
                        p { class: "clip-text", "{text}" }
                    }
                    div { class: "clip-hashtags",
                        for tag in hashtags {
                            Link {
                                key: "{tag}",
                                class: "clip-hashtag",
                                to: AppView::HashtagClipsView { tag: tag.clone() },
                                "#{tag}"
                            }
                        }
                        if hidden_tags > 0 {
                            span { class: "clip-hashtag-more", "+{hidden_tags} more" }
                        }
                    }
                }

                div { class: "clip-actions",
                    button {
                        class: if state.liked { "clip-action liked" } else { "clip-action" },
                        aria_label: "Like",
                        onclick: on_like,
                        Icon {
                            name: if state.liked { "heart-filled".to_string() } else { "heart".to_string() },
                            class: "w-7 h-7".to_string(),
                        }
                        span { "{format_count(state.like_count)}" }
                    }
                    div { class: "clip-action",
                        Icon { name: "message".to_string(), class: "w-7 h-7".to_string() }
                        span { "{format_count(clip.comment_count())}" }
                    }
                    button {
                        class: if state.saved { "clip-action saved" } else { "clip-action" },
                        aria_label: "Save",
                        onclick: on_save,
                        Icon {
                            name: if state.saved { "bookmark-filled".to_string() } else { "bookmark".to_string() },
                            class: "w-7 h-7".to_string(),
                        }
                    }
                    button {
                        class: "clip-action",
                        aria_label: "Share",
                        onclick: on_share,
                        Icon { name: "share".to_string(), class: "w-7 h-7".to_string() }
                    }
                }
            }
        }
    }
}
