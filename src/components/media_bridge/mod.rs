//! DOM access for the clip feed. The web build talks to the elements through
//! web-sys; desktop and mobile webviews go through `document::eval` scripts.
//! Both sides return the same snapshot types so the polling loops are shared.

use crate::feed::viewport::FeedGeometry;
use crate::player::MediaSnapshot;
use dioxus::prelude::*;
use serde::Serialize;

pub const FEED_SCROLL_ID: &str = "clip-feed-scroll";
pub const FEED_SENTINEL_ID: &str = "clip-feed-sentinel";

pub fn video_dom_id(clip_id: &str) -> String {
    format!("clip-video-{clip_id}")
}

pub fn card_dom_id(clip_id: &str) -> String {
    format!("clip-card-{clip_id}")
}

/// Imperative operations on one `<video>` element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum MediaCommand {
    Load(String),
    Play,
    Pause,
    Restart,
    Seek(f64),
    SetMuted(bool),
    SetVolume(f64),
    SetLoop(bool),
}

// Browser implementation over web-sys.
include!("web_backend.rs");
// Desktop-webview eval bridge for native targets.
include!("native_bridge.rs");

/// Resolves the page origin and hands the post link to the share sheet, or the
/// clipboard when no share sheet exists.
pub async fn share_post(post_id: &str, title: &str) {
    let origin = page_origin().await;
    let url = crate::feed::share_url(&origin, post_id);
    let payload = serde_json::json!({ "url": url, "title": title });
    let script = format!(
        r#"return (async function () {{
            const data = {payload};
            try {{
              if (navigator.share) {{
                await navigator.share({{ title: data.title, url: data.url }});
                return "shared";
              }}
              if (navigator.clipboard) {{
                await navigator.clipboard.writeText(data.url);
                return "copied";
              }}
            }} catch (_err) {{
              return "cancelled";
            }}
            return "unsupported";
        }})();"#
    );
    match document::eval(&script).join::<String>().await {
        Ok(outcome) => tracing::debug!(%outcome, %url, "share finished"),
        Err(err) => tracing::debug!(?err, "share bridge failed"),
    }
}

pub async fn page_origin() -> String {
    document::eval("return window.location.origin;")
        .join::<String>()
        .await
        .unwrap_or_default()
}
