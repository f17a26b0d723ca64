#[cfg(not(target_arch = "wasm32"))]
const NATIVE_MEDIA_BOOTSTRAP_JS: &str = r#"
(() => {
  if (window.__civicclipsMedia) {
    return true;
  }

  const rect = (element) => {
    const r = element.getBoundingClientRect();
    return { top: r.top, bottom: r.bottom };
  };

  window.__civicclipsMedia = {
    apply(id, command) {
      const video = document.getElementById(id);
      if (!video) return false;
      switch (command.op) {
        case "load":
          video.src = command.value;
          video.load();
          break;
        case "play": {
          const pending = video.play();
          if (pending && pending.catch) pending.catch(() => {});
          break;
        }
        case "pause":
          video.pause();
          break;
        case "restart":
          video.currentTime = 0;
          break;
        case "seek":
          video.currentTime = Math.max(0, command.value);
          break;
        case "set_muted":
          video.muted = !!command.value;
          break;
        case "set_volume":
          video.volume = Math.min(1, Math.max(0, command.value));
          break;
        case "set_loop":
          video.loop = !!command.value;
          break;
      }
      return true;
    },
    snapshot(id) {
      const video = document.getElementById(id);
      if (!video) return null;
      return {
        ready_state: video.readyState,
        current_time: Number.isFinite(video.currentTime) ? video.currentTime : 0,
        duration: Number.isFinite(video.duration) ? video.duration : 0,
        paused: !!video.paused,
        ended: !!video.ended,
        error_code: video.error ? video.error.code : null,
      };
    },
    geometry(rootId, sentinelId) {
      const root = document.getElementById(rootId);
      if (!root) return null;
      const sentinel = document.getElementById(sentinelId);
      const cards = Array.from(root.querySelectorAll("[data-clip-id]")).map((card) => {
        const span = rect(card);
        return { id: card.dataset.clipId, top: span.top, bottom: span.bottom };
      });
      return {
        page_hidden: document.hidden,
        root: rect(root),
        sentinel: sentinel ? rect(sentinel) : null,
        cards,
      };
    },
  };
  return true;
})();
"#;

#[cfg(not(target_arch = "wasm32"))]
fn ensure_native_media_bridge() {
    let _ = document::eval(NATIVE_MEDIA_BOOTSTRAP_JS);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn apply_media_command(video_id: &str, command: &MediaCommand) {
    ensure_native_media_bridge();
    let payload = serde_json::to_string(command).unwrap_or_else(|_| "{}".to_string());
    let id = serde_json::to_string(video_id).unwrap_or_else(|_| "\"\"".to_string());
    let script = format!(
        r#"(function () {{
            const bridge = window.__civicclipsMedia;
            if (!bridge) return false;
            return bridge.apply({id}, {payload});
        }})();"#
    );
    let _ = document::eval(&script);
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn read_media_snapshot(video_id: &str) -> Option<MediaSnapshot> {
    ensure_native_media_bridge();
    let id = serde_json::to_string(video_id).ok()?;
    let script = format!(
        r#"return (function () {{
            const bridge = window.__civicclipsMedia;
            return bridge ? bridge.snapshot({id}) : null;
        }})();"#
    );
    document::eval(&script)
        .join::<Option<MediaSnapshot>>()
        .await
        .ok()
        .flatten()
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn read_feed_geometry() -> Option<FeedGeometry> {
    ensure_native_media_bridge();
    let script = format!(
        r#"return (function () {{
            const bridge = window.__civicclipsMedia;
            return bridge ? bridge.geometry("{FEED_SCROLL_ID}", "{FEED_SENTINEL_ID}") : null;
        }})();"#
    );
    document::eval(&script)
        .join::<Option<FeedGeometry>>()
        .await
        .ok()
        .flatten()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn toggle_fullscreen(element_id: &str) {
    let id = serde_json::to_string(element_id).unwrap_or_else(|_| "\"\"".to_string());
    let script = format!(
        r#"(function () {{
            if (document.fullscreenElement) {{
              document.exitFullscreen().catch(() => {{}});
              return;
            }}
            const element = document.getElementById({id});
            if (element && element.requestFullscreen) {{
              element.requestFullscreen().catch(() => {{}});
            }}
        }})();"#
    );
    let _ = document::eval(&script);
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn is_fullscreen() -> bool {
    document::eval("return !!document.fullscreenElement;")
        .join::<bool>()
        .await
        .unwrap_or(false)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn delay_ms(ms: u32) {
    tokio::time::sleep(std::time::Duration::from_millis(ms as u64)).await;
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod bridge_tests {
    use super::*;

    #[test]
    fn commands_serialize_for_the_bridge() {
        let load = serde_json::to_value(MediaCommand::Load("https://cdn.example/a.mp4".into())).unwrap();
        assert_eq!(load, serde_json::json!({ "op": "load", "value": "https://cdn.example/a.mp4" }));
        let play = serde_json::to_value(MediaCommand::Play).unwrap();
        assert_eq!(play, serde_json::json!({ "op": "play" }));
        let muted = serde_json::to_value(MediaCommand::SetMuted(true)).unwrap();
        assert_eq!(muted, serde_json::json!({ "op": "set_muted", "value": true }));
    }

    #[test]
    fn dom_ids_are_stable() {
        assert_eq!(video_dom_id("abc"), "clip-video-abc");
        assert_eq!(card_dom_id("abc"), "clip-card-abc");
    }
}
