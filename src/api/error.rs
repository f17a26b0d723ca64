use thiserror::Error;

/// Failure taxonomy for the clip feed. Only `PaginationFetch` is ever shown to
/// the user; everything else is contained to one card or dropped after logging.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("media failed to load from {url}: {reason}")]
    NetworkLoad { url: String, reason: String },

    #[error("play request superseded: {0}")]
    PlaybackRace(String),

    #[error("view event not delivered: {0}")]
    AnalyticsDelivery(String),

    #[error("could not load clips: {0}")]
    PaginationFetch(String),

    #[error("engagement update failed: {0}")]
    EngagementMutation(String),

    #[error("backend is not configured")]
    NotConfigured,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

