use crate::api::{format_duration, Clip};
use crate::components::media_bridge::{
    apply_media_command, delay_ms, is_fullscreen, read_media_snapshot, toggle_fullscreen,
    video_dom_id, MediaCommand,
};
use crate::components::{ActiveClipSignal, FeedServices, Icon, PageVisibleSignal, PreloadedClips};
use crate::diagnostics::{log_perf, log_slow_load, now_ms};
use crate::player::{
    LoadPlan, MediaObserver, MuteBroadcastState, PlaybackSession, PlaybackState, PlayerCommand,
    PlayerEvent, MEDIA_POLL_MS,
};
use dioxus::prelude::*;
use std::rc::Rc;

/// Everything a player needs to turn session commands into media calls.
#[derive(Clone)]
struct PlayerHandle {
    clip_id: String,
    video_id: String,
    session: Signal<PlaybackSession>,
    observer: Signal<MediaObserver>,
    load_started: Signal<Option<f64>>,
    services: FeedServices,
}

impl PlayerHandle {
    fn dispatch(&self, event: PlayerEvent) {
        let mut session = self.session;
        let commands = session.write().handle(event);
        self.run(commands);
    }

    fn run(&self, commands: Vec<PlayerCommand>) {
        for command in commands {
            match command {
                PlayerCommand::Load { url } => {
                    let mut observer = self.observer;
                    let mut load_started = self.load_started;
                    observer.write().reset();
                    load_started.set(Some(now_ms()));
                    apply_media_command(&self.video_id, &MediaCommand::Load(url));
                }
                PlayerCommand::Play => apply_media_command(&self.video_id, &MediaCommand::Play),
                PlayerCommand::Pause => apply_media_command(&self.video_id, &MediaCommand::Pause),
                PlayerCommand::Restart => {
                    apply_media_command(&self.video_id, &MediaCommand::Restart)
                }
                PlayerCommand::ReportView(sample) => {
                    let services = self.services.clone();
                    let clip_id = self.clip_id.clone();
                    spawn(async move {
                        services
                            .reporter
                            .report(services.backend.as_ref(), &clip_id, sample)
                            .await;
                    });
                }
            }
        }
    }

    fn note_metadata(&self) {
        let mut load_started = self.load_started;
        let Some(started) = load_started.take() else {
            return;
        };
        let source = self
            .session
            .peek()
            .current_source()
            .unwrap_or_default()
            .to_string();
        log_slow_load(&self.clip_id, &source, started);
        log_perf("clip metadata", started, &self.clip_id);
    }
}

#[component]
pub fn ClipPlayer(clip: Rc<Clip>) -> Element {
    let services = use_context::<FeedServices>();
    let mute = use_context::<MuteBroadcastState>();
    let active_clip = use_context::<ActiveClipSignal>().0;
    let page_visible = use_context::<PageVisibleSignal>().0;
    let preloaded = use_context::<PreloadedClips>().0;

    let video_id = video_dom_id(&clip.id);
    let stage_id = format!("clip-stage-{}", clip.id);

    let session = use_signal(|| {
        PlaybackSession::new(
            LoadPlan::for_clip(&clip.video_url, &clip.fallback_urls),
            services.loop_clips,
        )
    });
    let observer = use_signal(MediaObserver::new);
    let load_started = use_signal(|| None::<f64>);
    let mut muted = use_signal(|| mute.get());
    let mut volume = use_signal(|| if mute.get() { 0.0 } else { 1.0 });
    let mut fullscreen = use_signal(|| false);

    let handle = PlayerHandle {
        clip_id: clip.id.clone(),
        video_id: video_id.clone(),
        session,
        observer,
        load_started,
        services: services.clone(),
    };

    // Active clip, tab visibility and preload margin all feed the session.
    {
        let handle = handle.clone();
        use_effect(move || {
            let active = active_clip.read().as_deref() == Some(handle.clip_id.as_str());
            handle.dispatch(PlayerEvent::ActiveChanged(active));
        });
    }
    {
        let handle = handle.clone();
        use_effect(move || {
            let visible = page_visible();
            handle.dispatch(PlayerEvent::PageVisibilityChanged(visible));
        });
    }
    {
        let handle = handle.clone();
        use_effect(move || {
            if preloaded.read().contains(&handle.clip_id) {
                handle.dispatch(PlayerEvent::EnteredPreloadMargin);
            }
        });
    }

    // Media polling.
    {
        let handle = handle.clone();
        use_effect(move || {
            let handle = handle.clone();
            spawn(async move {
                loop {
                    delay_ms(MEDIA_POLL_MS).await;
                    let state = handle.session.peek().state();
                    if matches!(state, PlaybackState::NotLoaded | PlaybackState::Error) {
                        continue;
                    }
                    let Some(snapshot) = read_media_snapshot(&handle.video_id).await else {
                        continue;
                    };
                    let mut observer = handle.observer;
                    let events = observer.write().observe(&snapshot, state.is_playing());
                    for event in events {
                        if matches!(event, PlayerEvent::MetadataLoaded { .. }) {
                            handle.note_metadata();
                        }
                        handle.dispatch(event);
                    }
                }
            });
        });
    }

    // Follow the feed-wide mute flag.
    {
        let mute = mute.clone();
        let video_id = video_id.clone();
        use_effect(move || {
            let mut receiver = mute.subscribe();
            let video_id = video_id.clone();
            spawn(async move {
                while receiver.changed().await.is_ok() {
                    let value = *receiver.borrow_and_update();
                    apply_media_command(&video_id, &MediaCommand::SetMuted(value));
                    muted.set(value);
                    if !value && volume() == 0.0 {
                        volume.set(1.0);
                        apply_media_command(&video_id, &MediaCommand::SetVolume(1.0));
                    }
                }
            });
        });
    }

    let on_video_mounted = {
        let video_id = video_id.clone();
        let mute = mute.clone();
        let loop_clips = services.loop_clips;
        move |_: MountedEvent| {
            apply_media_command(&video_id, &MediaCommand::SetMuted(mute.get()));
            apply_media_command(&video_id, &MediaCommand::SetLoop(loop_clips));
            apply_media_command(&video_id, &MediaCommand::SetVolume(volume()));
        }
    };

    let on_stage_click = {
        let handle = handle.clone();
        move |_: MouseEvent| {
            let event = handle.session.peek().toggle_event();
            handle.dispatch(event);
        }
    };

    let on_mute_click = {
        let mute = mute.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            mute.toggle();
        }
    };

    let on_volume_input = {
        let mute = mute.clone();
        let video_id = video_id.clone();
        move |evt: FormEvent| {
            let Ok(value) = evt.value().parse::<f64>() else {
                return;
            };
            let value = value.clamp(0.0, 1.0);
            volume.set(value);
            apply_media_command(&video_id, &MediaCommand::SetVolume(value));
            mute.set(value == 0.0);
        }
    };

    let on_seek_input = {
        let handle = handle.clone();
        move |evt: FormEvent| {
            let Ok(position) = evt.value().parse::<f64>() else {
                return;
            };
            apply_media_command(&handle.video_id, &MediaCommand::Seek(position));
            handle.dispatch(PlayerEvent::Progress { position });
        }
    };

    let on_fullscreen_click = {
        let stage_id = stage_id.clone();
        move |evt: MouseEvent| {
            evt.stop_propagation();
            toggle_fullscreen(&stage_id);
            spawn(async move {
                delay_ms(MEDIA_POLL_MS).await;
                fullscreen.set(is_fullscreen().await);
            });
        }
    };

    let current = session.read();
    let state = current.state();
    let position = current.position();
    let started = current.has_started();
    let duration = current
        .duration()
        .unwrap_or(clip.duration)
        .max(0.0);
    let failure = current
        .last_failure()
        .unwrap_or("network error")
        .to_string();
    drop(current);

    let progress_percent = if duration > 0.0 {
        (position / duration * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let is_muted = muted();
    let poster = clip.thumbnail_url.clone().unwrap_or_default();

    rsx! {
        div {
            id: "{stage_id}",
            class: "clip-stage",
            "data-state": state.label(),
            onclick: on_stage_click,

            video {
                id: "{video_id}",
                class: "clip-video",
                poster: "{poster}",
                preload: "metadata",
                "playsinline": "true",
                "webkit-playsinline": "true",
                onmounted: on_video_mounted,
            }

            match state {
                PlaybackState::Error => rsx! {
                    div { class: "clip-error",
                        if !poster.is_empty() {
                            img { class: "clip-error-thumb", src: "{poster}", alt: "" }
                        }
                        div { class: "clip-error-body",
                            Icon { name: "alert".to_string(), class: "w-8 h-8".to_string() }
                            p { "This clip couldn't be played" }
                            span { class: "clip-error-detail", "{failure}" }
                        }
                    }
                },
                PlaybackState::Loading | PlaybackState::Buffering => rsx! {
                    div { class: "clip-spinner",
                        Icon { name: "loader".to_string(), class: "w-10 h-10".to_string() }
                    }
                },
                PlaybackState::Paused | PlaybackState::Ended | PlaybackState::Ready => rsx! {
                    div { class: "clip-play-hint",
                        Icon { name: "play".to_string(), class: "w-14 h-14".to_string() }
                    }
                },
                _ => rsx! {},
            }

            if state != PlaybackState::Error {
                div {
                    class: "clip-controls",
                    onclick: move |evt: MouseEvent| evt.stop_propagation(),

                    button {
                        class: "clip-control-btn",
                        aria_label: if is_muted { "Unmute" } else { "Mute" },
                        onclick: on_mute_click,
                        Icon {
                            name: if is_muted { "volume-x".to_string() } else { "volume".to_string() },
                            class: "w-5 h-5".to_string(),
                        }
                    }
                    input {
                        class: "clip-volume",
                        r#type: "range",
                        min: "0",
                        max: "1",
                        step: "0.05",
                        value: "{volume}",
                        aria_label: "Volume",
                        oninput: on_volume_input,
                    }
                    if started {
                        span { class: "clip-time",
                            "{format_duration(position)} / {format_duration(duration)}"
                        }
                    }
                    button {
                        class: "clip-control-btn",
                        aria_label: if fullscreen() { "Exit fullscreen" } else { "Fullscreen" },
                        onclick: on_fullscreen_click,
                        Icon {
                            name: if fullscreen() { "minimize".to_string() } else { "maximize".to_string() },
                            class: "w-5 h-5".to_string(),
                        }
                    }
                }
                input {
                    class: "clip-seek",
                    r#type: "range",
                    min: "0",
                    max: "{duration}",
                    step: "0.1",
                    value: "{position}",
                    aria_label: "Seek",
                    style: "--clip-progress: {progress_percent}%",
                    onclick: move |evt: MouseEvent| evt.stop_propagation(),
                    oninput: on_seek_input,
                }
            }
        }
    }
}
