#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

#[cfg(target_arch = "wasm32")]
fn video_element(video_id: &str) -> Option<web_sys::HtmlVideoElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(video_id)?
        .dyn_into::<web_sys::HtmlVideoElement>()
        .ok()
}

#[cfg(target_arch = "wasm32")]
fn span_of(element: &web_sys::Element) -> crate::feed::viewport::Span {
    let rect = element.get_bounding_client_rect();
    crate::feed::viewport::Span {
        top: rect.top(),
        bottom: rect.bottom(),
    }
}

#[cfg(target_arch = "wasm32")]
fn media_error_code(video: &web_sys::HtmlVideoElement) -> Option<u16> {
    let error = js_sys::Reflect::get(video, &"error".into()).ok()?;
    if error.is_null() || error.is_undefined() {
        return None;
    }
    js_sys::Reflect::get(&error, &"code".into())
        .ok()?
        .as_f64()
        .map(|code| code as u16)
}

#[cfg(target_arch = "wasm32")]
pub fn apply_media_command(video_id: &str, command: &MediaCommand) {
    let Some(video) = video_element(video_id) else {
        tracing::debug!(video_id, ?command, "media element not mounted");
        return;
    };
    match command {
        MediaCommand::Load(url) => {
            video.set_src(url);
            video.load();
        }
        MediaCommand::Play => match video.play() {
            Ok(promise) => {
                let video_id = video_id.to_string();
                wasm_bindgen_futures::spawn_local(async move {
                    // A pause or source swap rejects the pending promise.
                    if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        let race = crate::api::FeedError::PlaybackRace(format!("{err:?}"));
                        tracing::debug!(%video_id, error = %race, "discarding rejected play");
                    }
                });
            }
            Err(err) => tracing::debug!(video_id, ?err, "play call threw"),
        },
        MediaCommand::Pause => {
            let _ = video.pause();
        }
        MediaCommand::Restart => video.set_current_time(0.0),
        MediaCommand::Seek(position) => video.set_current_time(position.max(0.0)),
        MediaCommand::SetMuted(muted) => video.set_muted(*muted),
        MediaCommand::SetVolume(volume) => video.set_volume(volume.clamp(0.0, 1.0)),
        MediaCommand::SetLoop(enabled) => video.set_loop(*enabled),
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn read_media_snapshot(video_id: &str) -> Option<MediaSnapshot> {
    let video = video_element(video_id)?;
    Some(MediaSnapshot {
        ready_state: video.ready_state(),
        current_time: video.current_time(),
        duration: video.duration(),
        paused: video.paused(),
        ended: video.ended(),
        error_code: media_error_code(&video),
    })
}

#[cfg(target_arch = "wasm32")]
pub async fn read_feed_geometry() -> Option<FeedGeometry> {
    let document = web_sys::window()?.document()?;
    let root = document.get_element_by_id(FEED_SCROLL_ID)?;
    let sentinel = document
        .get_element_by_id(FEED_SENTINEL_ID)
        .map(|element| span_of(&element));

    let mut cards = Vec::new();
    let nodes = root.query_selector_all("[data-clip-id]").ok()?;
    for index in 0..nodes.length() {
        let Some(element) = nodes
            .item(index)
            .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
        else {
            continue;
        };
        let Some(id) = element.get_attribute("data-clip-id") else {
            continue;
        };
        cards.push(crate::feed::viewport::CardSpan {
            id,
            span: span_of(&element),
        });
    }

    Some(FeedGeometry {
        page_hidden: document.hidden(),
        root: span_of(&root),
        sentinel,
        cards,
    })
}

#[cfg(target_arch = "wasm32")]
pub fn toggle_fullscreen(element_id: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
    } else if let Some(element) = document.get_element_by_id(element_id) {
        if let Err(err) = element.request_fullscreen() {
            tracing::debug!(element_id, ?err, "fullscreen request refused");
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn is_fullscreen() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .map(|document| document.fullscreen_element().is_some())
        .unwrap_or(false)
}

#[cfg(target_arch = "wasm32")]
pub async fn delay_ms(ms: u32) {
    gloo_timers::future::TimeoutFuture::new(ms).await;
}
