//! Playback state machine for one mounted clip player.
//!
//! The session never touches the media element directly. Every observation is
//! fed in as a [`PlayerEvent`] and the caller applies the returned
//! [`PlayerCommand`]s to whatever media backend is in use.

use super::sources::{LoadPlan, RetryDecision};
use crate::api::FeedError;

/// Position after which a clip counts as started.
pub const STARTED_AFTER_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    NotLoaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Buffering,
    Error,
    Ended,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotLoaded => "not-loaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Error => "error",
            Self::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    EnteredPreloadMargin,
    MetadataLoaded { duration: f64 },
    LoadFailed { reason: String },
    ActiveChanged(bool),
    PageVisibilityChanged(bool),
    UserPlay,
    UserPause,
    Progress { position: f64 },
    Stalled,
    Recovered,
    ReachedEnd,
    /// The media element wrapped around on its own.
    Looped,
    /// The element stopped without being told to (autoplay block, media keys).
    PausedExternally,
}

/// One watch sample handed to the analytics reporter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSample {
    pub watch_duration_seconds: f64,
    pub watch_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Load { url: String },
    Play,
    Pause,
    /// Seek to zero; always followed by `Play` when issued.
    Restart,
    ReportView(ViewSample),
}

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    state: PlaybackState,
    plan: LoadPlan,
    has_started: bool,
    is_active: bool,
    page_visible: bool,
    manually_paused: bool,
    position: f64,
    duration: Option<f64>,
    loop_enabled: bool,
    last_failure: Option<String>,
}

impl PlaybackSession {
    pub fn new(plan: LoadPlan, loop_enabled: bool) -> Self {
        Self {
            state: PlaybackState::NotLoaded,
            plan,
            has_started: false,
            is_active: false,
            page_visible: true,
            manually_paused: false,
            position: 0.0,
            duration: None,
            loop_enabled,
            last_failure: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn attempts(&self) -> u32 {
        self.plan.attempts()
    }

    pub fn current_source(&self) -> Option<&str> {
        self.plan.current()
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Tap-to-toggle maps onto the explicit play/pause events.
    pub fn toggle_event(&self) -> PlayerEvent {
        if self.state.is_playing() {
            PlayerEvent::UserPause
        } else {
            PlayerEvent::UserPlay
        }
    }

    fn should_play(&self) -> bool {
        self.is_active && self.page_visible && !self.manually_paused
    }

    pub fn handle(&mut self, event: PlayerEvent) -> Vec<PlayerCommand> {
        let mut commands = Vec::new();
        if self.state == PlaybackState::Error {
            return commands;
        }
        let before = self.state;

        match event {
            PlayerEvent::EnteredPreloadMargin => {
                if self.state == PlaybackState::NotLoaded {
                    self.start_loading(&mut commands);
                }
            }
            PlayerEvent::MetadataLoaded { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    self.duration = Some(duration);
                }
                if self.state == PlaybackState::Loading {
                    self.state = PlaybackState::Ready;
                    self.reconcile(&mut commands);
                }
            }
            PlayerEvent::LoadFailed { reason } => self.fail_source(reason, &mut commands),
            PlayerEvent::ActiveChanged(active) => {
                let rising = active && !self.is_active;
                self.is_active = active;
                if rising {
                    self.manually_paused = false;
                }
                match self.state {
                    PlaybackState::NotLoaded if active => self.start_loading(&mut commands),
                    PlaybackState::Ended if rising && self.page_visible => {
                        self.restart(&mut commands)
                    }
                    _ => self.reconcile(&mut commands),
                }
            }
            PlayerEvent::PageVisibilityChanged(visible) => {
                self.page_visible = visible;
                self.reconcile(&mut commands);
            }
            PlayerEvent::UserPlay => {
                self.manually_paused = false;
                match self.state {
                    PlaybackState::NotLoaded => self.start_loading(&mut commands),
                    PlaybackState::Ended if self.should_play() => self.restart(&mut commands),
                    _ => self.reconcile(&mut commands),
                }
            }
            PlayerEvent::UserPause => {
                self.manually_paused = true;
                self.reconcile(&mut commands);
            }
            PlayerEvent::Progress { position } => {
                if position.is_finite() && position >= 0.0 {
                    self.position = position;
                    if position > STARTED_AFTER_SECONDS {
                        self.has_started = true;
                    }
                }
            }
            PlayerEvent::Stalled => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Buffering;
                }
            }
            PlayerEvent::Recovered => {
                if self.state == PlaybackState::Buffering {
                    self.state = PlaybackState::Playing;
                    self.reconcile(&mut commands);
                }
            }
            PlayerEvent::ReachedEnd => {
                if self.state.is_playing() {
                    if self.loop_enabled {
                        self.position = 0.0;
                        self.state = PlaybackState::Playing;
                        commands.push(PlayerCommand::Restart);
                        commands.push(PlayerCommand::Play);
                    } else {
                        if let Some(duration) = self.duration {
                            self.position = duration;
                        }
                        self.state = PlaybackState::Ended;
                        if let Some(sample) = self.view_sample() {
                            commands.push(PlayerCommand::ReportView(sample));
                        }
                    }
                }
            }
            PlayerEvent::Looped => {
                self.position = 0.0;
            }
            PlayerEvent::PausedExternally => {
                if self.state.is_playing() {
                    self.manually_paused = true;
                    self.state = PlaybackState::Paused;
                    if let Some(sample) = self.view_sample() {
                        commands.push(PlayerCommand::ReportView(sample));
                    }
                }
            }
        }

        if before != self.state {
            tracing::debug!(from = before.label(), to = self.state.label(), "clip playback transition");
        }
        commands
    }

    fn start_loading(&mut self, commands: &mut Vec<PlayerCommand>) {
        match self.plan.current() {
            Some(url) => {
                self.state = PlaybackState::Loading;
                commands.push(PlayerCommand::Load {
                    url: url.to_string(),
                });
            }
            None => {
                self.state = PlaybackState::Error;
                tracing::warn!("clip has no playable source");
            }
        }
    }

    fn fail_source(&mut self, reason: String, commands: &mut Vec<PlayerCommand>) {
        if matches!(self.state, PlaybackState::NotLoaded) {
            return;
        }
        let was_playing = self.state.is_playing();
        let failed_url = self.plan.current().unwrap_or_default().to_string();
        match self.plan.record_failure() {
            RetryDecision::TryNext(url) => {
                tracing::debug!(attempts = self.plan.attempts(), %reason, "retrying clip on next source");
                self.state = PlaybackState::Loading;
                self.position = 0.0;
                commands.push(PlayerCommand::Load { url });
            }
            RetryDecision::GiveUp => {
                let error = FeedError::NetworkLoad {
                    url: failed_url,
                    reason: reason.clone(),
                };
                tracing::warn!(attempts = self.plan.attempts(), %error, "clip failed to load on every source");
                self.state = PlaybackState::Error;
                if was_playing {
                    commands.push(PlayerCommand::Pause);
                }
            }
        }
        self.last_failure = Some(reason);
    }

    fn restart(&mut self, commands: &mut Vec<PlayerCommand>) {
        self.position = 0.0;
        self.state = PlaybackState::Playing;
        commands.push(PlayerCommand::Restart);
        commands.push(PlayerCommand::Play);
    }

    fn reconcile(&mut self, commands: &mut Vec<PlayerCommand>) {
        let play = self.should_play();
        match self.state {
            PlaybackState::Ready | PlaybackState::Paused if play => {
                self.state = PlaybackState::Playing;
                commands.push(PlayerCommand::Play);
            }
            PlaybackState::Playing | PlaybackState::Buffering if !play => {
                self.state = PlaybackState::Paused;
                commands.push(PlayerCommand::Pause);
                if let Some(sample) = self.view_sample() {
                    commands.push(PlayerCommand::ReportView(sample));
                }
            }
            _ => {}
        }
    }

    fn view_sample(&self) -> Option<ViewSample> {
        let duration = self.duration?;
        if self.position <= 0.0 {
            return None;
        }
        Some(ViewSample {
            watch_duration_seconds: self.position,
            watch_percentage: (self.position / duration * 100.0).clamp(0.0, 100.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::sources::MAX_RETRIES;

    fn session(loop_enabled: bool) -> PlaybackSession {
        PlaybackSession::new(
            LoadPlan::for_clip(
                "https://cdn.example/c.mp4",
                &[
                    "https://m1.example/c.mp4".to_string(),
                    "https://m2.example/c.mp4".to_string(),
                ],
            ),
            loop_enabled,
        )
    }

    fn playing(duration: f64, loop_enabled: bool) -> PlaybackSession {
        let mut s = session(loop_enabled);
        s.handle(PlayerEvent::ActiveChanged(true));
        let commands = s.handle(PlayerEvent::MetadataLoaded { duration });
        assert_eq!(commands, vec![PlayerCommand::Play]);
        assert_eq!(s.state(), PlaybackState::Playing);
        s
    }

    fn reports(commands: &[PlayerCommand]) -> Vec<ViewSample> {
        commands
            .iter()
            .filter_map(|command| match command {
                PlayerCommand::ReportView(sample) => Some(*sample),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn preload_starts_loading_without_playing() {
        let mut s = session(false);
        let commands = s.handle(PlayerEvent::EnteredPreloadMargin);
        assert_eq!(
            commands,
            vec![PlayerCommand::Load {
                url: "https://cdn.example/c.mp4".into()
            }]
        );
        assert!(s.handle(PlayerEvent::EnteredPreloadMargin).is_empty());
        assert!(s.handle(PlayerEvent::MetadataLoaded { duration: 12.0 }).is_empty());
        assert_eq!(s.state(), PlaybackState::Ready);
    }

    #[test]
    fn failing_sources_end_in_error_after_three_attempts() {
        let mut s = session(false);
        s.handle(PlayerEvent::ActiveChanged(true));

        let first = s.handle(PlayerEvent::LoadFailed { reason: "404".into() });
        assert_eq!(first, vec![PlayerCommand::Load { url: "https://m1.example/c.mp4".into() }]);
        let second = s.handle(PlayerEvent::LoadFailed { reason: "404".into() });
        assert_eq!(second, vec![PlayerCommand::Load { url: "https://m2.example/c.mp4".into() }]);
        let third = s.handle(PlayerEvent::LoadFailed { reason: "404".into() });
        assert!(third.is_empty());
        assert_eq!(s.state(), PlaybackState::Error);
        assert_eq!(s.attempts(), MAX_RETRIES);

        for event in [
            PlayerEvent::LoadFailed { reason: "again".into() },
            PlayerEvent::UserPlay,
            PlayerEvent::ActiveChanged(false),
            PlayerEvent::ActiveChanged(true),
            PlayerEvent::EnteredPreloadMargin,
        ] {
            assert!(s.handle(event).is_empty());
        }
        assert_eq!(s.state(), PlaybackState::Error);
        assert_eq!(s.attempts(), MAX_RETRIES);
    }

    #[test]
    fn natural_end_reports_one_full_view() {
        let mut s = playing(30.0, false);
        for second in 1..=30 {
            let commands = s.handle(PlayerEvent::Progress { position: second as f64 });
            assert!(commands.is_empty());
        }
        let commands = s.handle(PlayerEvent::ReachedEnd);
        let samples = reports(&commands);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].watch_duration_seconds, 30.0);
        assert_eq!(samples[0].watch_percentage, 100.0);
        assert_eq!(s.state(), PlaybackState::Ended);

        // Scrolling away from an ended clip does not report again.
        assert!(reports(&s.handle(PlayerEvent::ActiveChanged(false))).is_empty());
        assert!(reports(&s.handle(PlayerEvent::ReachedEnd)).is_empty());
    }

    #[test]
    fn looping_clip_restarts_without_reporting() {
        let mut s = playing(10.0, true);
        s.handle(PlayerEvent::Progress { position: 10.0 });
        let commands = s.handle(PlayerEvent::ReachedEnd);
        assert_eq!(commands, vec![PlayerCommand::Restart, PlayerCommand::Play]);
        assert_eq!(s.state(), PlaybackState::Playing);
        assert_eq!(s.position(), 0.0);

        s.handle(PlayerEvent::Progress { position: 9.9 });
        assert!(s.handle(PlayerEvent::Looped).is_empty());
        assert_eq!(s.position(), 0.0);
    }

    #[test]
    fn hidden_tab_pauses_and_visible_tab_resumes() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::Progress { position: 4.0 });

        let hidden = s.handle(PlayerEvent::PageVisibilityChanged(false));
        assert_eq!(hidden[0], PlayerCommand::Pause);
        assert_eq!(reports(&hidden).len(), 1);
        assert_eq!(s.state(), PlaybackState::Paused);

        let visible = s.handle(PlayerEvent::PageVisibilityChanged(true));
        assert_eq!(visible, vec![PlayerCommand::Play]);
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn visible_tab_does_not_resume_inactive_clip() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::PageVisibilityChanged(false));
        s.handle(PlayerEvent::ActiveChanged(false));
        assert!(s.handle(PlayerEvent::PageVisibilityChanged(true)).is_empty());
        assert_eq!(s.state(), PlaybackState::Paused);
    }

    #[test]
    fn play_and_pause_are_idempotent() {
        let mut s = playing(20.0, false);
        assert!(s.handle(PlayerEvent::UserPlay).is_empty());
        s.handle(PlayerEvent::Progress { position: 2.0 });

        let paused = s.handle(PlayerEvent::UserPause);
        assert_eq!(paused.len(), 2);
        assert!(s.handle(PlayerEvent::UserPause).is_empty());
        assert_eq!(s.state(), PlaybackState::Paused);
    }

    #[test]
    fn pause_without_progress_skips_report() {
        let mut s = playing(20.0, false);
        let commands = s.handle(PlayerEvent::ActiveChanged(false));
        assert_eq!(commands, vec![PlayerCommand::Pause]);
    }

    #[test]
    fn manual_pause_is_cleared_when_clip_becomes_active_again() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::UserPause);
        assert!(s.handle(PlayerEvent::PageVisibilityChanged(true)).is_empty());
        s.handle(PlayerEvent::ActiveChanged(false));
        let commands = s.handle(PlayerEvent::ActiveChanged(true));
        assert_eq!(commands, vec![PlayerCommand::Play]);
    }

    #[test]
    fn buffering_recovers_without_retrying() {
        let mut s = playing(20.0, false);
        assert!(s.handle(PlayerEvent::Stalled).is_empty());
        assert_eq!(s.state(), PlaybackState::Buffering);
        assert!(s.handle(PlayerEvent::Recovered).is_empty());
        assert_eq!(s.state(), PlaybackState::Playing);
        assert_eq!(s.attempts(), 0);
    }

    #[test]
    fn pausing_while_buffering_reports_view() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::Progress { position: 5.0 });
        s.handle(PlayerEvent::Stalled);
        let commands = s.handle(PlayerEvent::ActiveChanged(false));
        assert_eq!(reports(&commands)[0].watch_percentage, 25.0);
    }

    #[test]
    fn ended_clip_restarts_on_play_or_reactivation() {
        let mut s = playing(5.0, false);
        s.handle(PlayerEvent::Progress { position: 5.0 });
        s.handle(PlayerEvent::ReachedEnd);
        assert_eq!(
            s.handle(PlayerEvent::UserPlay),
            vec![PlayerCommand::Restart, PlayerCommand::Play]
        );

        s.handle(PlayerEvent::ReachedEnd);
        s.handle(PlayerEvent::ActiveChanged(false));
        assert_eq!(
            s.handle(PlayerEvent::ActiveChanged(true)),
            vec![PlayerCommand::Restart, PlayerCommand::Play]
        );
    }

    #[test]
    fn mid_playback_failure_moves_to_next_source() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::Progress { position: 3.0 });
        let commands = s.handle(PlayerEvent::LoadFailed { reason: "decode".into() });
        assert_eq!(commands, vec![PlayerCommand::Load { url: "https://m1.example/c.mp4".into() }]);
        assert_eq!(s.state(), PlaybackState::Loading);
        assert_eq!(s.handle(PlayerEvent::MetadataLoaded { duration: 20.0 }), vec![PlayerCommand::Play]);
    }

    #[test]
    fn external_pause_follows_the_element_and_tap_resumes() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::Progress { position: 6.0 });

        let commands = s.handle(PlayerEvent::PausedExternally);
        assert_eq!(reports(&commands).len(), 1);
        assert!(!commands.contains(&PlayerCommand::Pause));
        assert_eq!(s.state(), PlaybackState::Paused);
        assert_eq!(s.toggle_event(), PlayerEvent::UserPlay);

        // Visibility churn must not fight the element.
        assert!(s.handle(PlayerEvent::PageVisibilityChanged(true)).is_empty());
        assert!(s.handle(PlayerEvent::PausedExternally).is_empty());

        assert_eq!(s.handle(PlayerEvent::UserPlay), vec![PlayerCommand::Play]);
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn has_started_flips_after_one_second() {
        let mut s = playing(20.0, false);
        s.handle(PlayerEvent::Progress { position: 0.8 });
        assert!(!s.has_started());
        s.handle(PlayerEvent::Progress { position: 1.2 });
        assert!(s.has_started());
    }
}
