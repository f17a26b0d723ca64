//! Media element observation.
//!
//! Both the web-sys backend and the desktop eval bridge sample the `<video>`
//! element on a fixed interval. [`MediaObserver`] diffs consecutive samples
//! into [`PlayerEvent`]s so the session never sees raw element state.

use super::session::PlayerEvent;
use serde::Deserialize;

/// Polling interval for the media loop.
pub const MEDIA_POLL_MS: u32 = 200;

pub const HAVE_METADATA: u16 = 1;
pub const HAVE_FUTURE_DATA: u16 = 3;

const PROGRESS_STEP_SECONDS: f64 = 0.2;
const LOOP_WRAP_SECONDS: f64 = 1.0;
/// Consecutive paused samples before a playing session follows the element.
const EXTERNAL_PAUSE_POLLS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct MediaSnapshot {
    #[serde(default)]
    pub ready_state: u16,
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default = "default_paused")]
    pub paused: bool,
    #[serde(default)]
    pub ended: bool,
    #[serde(default)]
    pub error_code: Option<u16>,
}

fn default_paused() -> bool {
    true
}

pub fn media_error_label(code: u16) -> &'static str {
    match code {
        1 => "playback aborted",
        2 => "network error",
        3 => "decode error",
        4 => "source not supported",
        _ => "unknown media error",
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaObserver {
    metadata_reported: bool,
    error_reported: bool,
    ended_reported: bool,
    stalled: bool,
    last_position: f64,
    paused_polls: u8,
}

impl MediaObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything seen for the previous source.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn observe(&mut self, snapshot: &MediaSnapshot, session_playing: bool) -> Vec<PlayerEvent> {
        let mut events = Vec::new();

        if let Some(code) = snapshot.error_code {
            if !self.error_reported {
                self.error_reported = true;
                events.push(PlayerEvent::LoadFailed {
                    reason: media_error_label(code).to_string(),
                });
            }
            return events;
        }

        if !self.metadata_reported
            && snapshot.ready_state >= HAVE_METADATA
            && snapshot.duration.is_finite()
            && snapshot.duration > 0.0
        {
            self.metadata_reported = true;
            events.push(PlayerEvent::MetadataLoaded {
                duration: snapshot.duration,
            });
        }

        let time = snapshot.current_time;
        if time.is_finite() {
            let wrapped = session_playing
                && !snapshot.ended
                && self.last_position - time > LOOP_WRAP_SECONDS
                && snapshot.duration.is_finite()
                && self.last_position >= snapshot.duration - LOOP_WRAP_SECONDS;
            if wrapped {
                self.last_position = time;
                events.push(PlayerEvent::Looped);
            } else if (time - self.last_position).abs() >= PROGRESS_STEP_SECONDS {
                self.last_position = time;
                events.push(PlayerEvent::Progress { position: time });
            }
        }

        if session_playing && !snapshot.paused {
            if !self.stalled && snapshot.ready_state < HAVE_FUTURE_DATA && !snapshot.ended {
                self.stalled = true;
                events.push(PlayerEvent::Stalled);
            } else if self.stalled && snapshot.ready_state >= HAVE_FUTURE_DATA {
                self.stalled = false;
                events.push(PlayerEvent::Recovered);
            }
        } else if self.stalled && snapshot.ready_state >= HAVE_FUTURE_DATA {
            self.stalled = false;
        }

        if session_playing && snapshot.paused && !snapshot.ended {
            self.paused_polls = self.paused_polls.saturating_add(1);
            if self.paused_polls == EXTERNAL_PAUSE_POLLS {
                events.push(PlayerEvent::PausedExternally);
            }
        } else {
            self.paused_polls = 0;
        }

        if snapshot.ended {
            if !self.ended_reported {
                self.ended_reported = true;
                if snapshot.duration.is_finite() && snapshot.duration > 0.0 {
                    self.last_position = snapshot.duration;
                }
                events.push(PlayerEvent::ReachedEnd);
            }
        } else {
            self.ended_reported = false;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ready_state: u16, current_time: f64, paused: bool) -> MediaSnapshot {
        MediaSnapshot {
            ready_state,
            current_time,
            duration: 30.0,
            paused,
            ended: false,
            error_code: None,
        }
    }

    #[test]
    fn metadata_is_reported_once() {
        let mut observer = MediaObserver::new();
        assert!(observer.observe(&MediaSnapshot::default(), false).is_empty());
        assert_eq!(
            observer.observe(&snap(1, 0.0, true), false),
            vec![PlayerEvent::MetadataLoaded { duration: 30.0 }]
        );
        assert!(observer.observe(&snap(4, 0.0, true), false).is_empty());
    }

    #[test]
    fn media_error_becomes_single_load_failure() {
        let mut observer = MediaObserver::new();
        let failed = MediaSnapshot {
            error_code: Some(4),
            ..MediaSnapshot::default()
        };
        assert_eq!(
            observer.observe(&failed, false),
            vec![PlayerEvent::LoadFailed {
                reason: "source not supported".into()
            }]
        );
        assert!(observer.observe(&failed, false).is_empty());

        observer.reset();
        assert_eq!(observer.observe(&failed, false).len(), 1);
    }

    #[test]
    fn stall_and_recovery_while_playing() {
        let mut observer = MediaObserver::new();
        observer.observe(&snap(4, 0.0, false), true);
        assert_eq!(observer.observe(&snap(2, 0.1, false), true), vec![PlayerEvent::Stalled]);
        assert!(observer.observe(&snap(2, 0.1, false), true).is_empty());
        assert_eq!(
            observer.observe(&snap(4, 0.5, false), true),
            vec![PlayerEvent::Progress { position: 0.5 }, PlayerEvent::Recovered]
        );
    }

    #[test]
    fn low_ready_state_while_paused_is_not_a_stall() {
        let mut observer = MediaObserver::new();
        observer.observe(&snap(4, 0.0, true), false);
        assert!(observer.observe(&snap(1, 0.0, true), false).is_empty());
    }

    #[test]
    fn ended_and_loop_wrap() {
        let mut observer = MediaObserver::new();
        observer.observe(&snap(4, 0.0, false), true);
        observer.observe(&snap(4, 29.6, false), true);
        assert_eq!(
            observer.observe(&snap(4, 0.1, false), true),
            vec![PlayerEvent::Looped]
        );

        let ended = MediaSnapshot {
            ended: true,
            current_time: 30.0,
            ..snap(4, 30.0, true)
        };
        let events = observer.observe(&ended, true);
        assert_eq!(events.last(), Some(&PlayerEvent::ReachedEnd));
        assert!(observer.observe(&ended, true).is_empty());
    }

    #[test]
    fn element_paused_under_a_playing_session_is_reported_once() {
        let mut observer = MediaObserver::new();
        observer.observe(&snap(4, 0.0, true), false);

        // One paused sample right after a play request is tolerated.
        assert!(observer.observe(&snap(4, 0.0, true), true).is_empty());
        assert_eq!(
            observer.observe(&snap(4, 0.0, true), true),
            vec![PlayerEvent::PausedExternally]
        );
        for _ in 0..50 {
            assert!(observer.observe(&snap(4, 0.0, true), true).is_empty());
        }
    }

    #[test]
    fn playing_sample_clears_the_pause_count() {
        let mut observer = MediaObserver::new();
        observer.observe(&snap(4, 0.0, true), false);
        observer.observe(&snap(4, 0.0, true), true);
        observer.observe(&snap(4, 0.0, false), true);
        assert!(observer.observe(&snap(4, 0.0, true), true).is_empty());

        let ended = MediaSnapshot {
            ended: true,
            ..snap(4, 30.0, true)
        };
        observer.observe(&ended, true);
        let events = observer.observe(&ended, true);
        assert!(!events.contains(&PlayerEvent::PausedExternally));
    }

    #[test]
    fn decodes_bridge_payload() {
        let snapshot: MediaSnapshot = serde_json::from_str(
            r#"{"ready_state":4,"current_time":3.5,"duration":12.0,"paused":false,"ended":false,"error_code":null}"#,
        )
        .unwrap();
        assert_eq!(snapshot.ready_state, 4);
        assert!(!snapshot.paused);
        let empty: MediaSnapshot = serde_json::from_str("{}").unwrap();
        assert!(empty.paused);
    }
}
