pub mod analytics;
pub mod media;
pub mod mute;
pub mod session;
pub mod sources;

pub use analytics::ViewAnalyticsReporter;
pub use media::{MediaObserver, MediaSnapshot, MEDIA_POLL_MS};
pub use mute::MuteBroadcastState;
pub use session::{PlaybackSession, PlaybackState, PlayerCommand, PlayerEvent};
pub use sources::LoadPlan;
