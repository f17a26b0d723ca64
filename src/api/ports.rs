//! Seams to the managed backend. Everything behind these traits is treated as an
//! external collaborator; the feed only depends on the shapes defined here.

use crate::api::error::FeedError;
use crate::api::models::{Clip, ClipFilters, EngagementMutation, ViewEvent};
use async_trait::async_trait;

/// Ordered query over ready clips, newest first, `PAGE_SIZE` rows per offset.
#[async_trait(?Send)]
pub trait ClipQuery {
    async fn fetch_clips(
        &self,
        filters: &ClipFilters,
        page_offset: u32,
    ) -> Result<Vec<Clip>, FeedError>;
}

/// Write-only sink for watch analytics.
#[async_trait(?Send)]
pub trait ViewEventSink {
    async fn record_view(&self, event: ViewEvent) -> Result<(), FeedError>;
}

/// Idempotent like/save toggles keyed by `(user_id, clip_id)`.
#[async_trait(?Send)]
pub trait EngagementSink {
    async fn apply(&self, mutation: EngagementMutation) -> Result<(), FeedError>;
}

#[cfg(test)]
mockall::mock! {
    pub ViewSink {}

    #[async_trait(?Send)]
    impl ViewEventSink for ViewSink {
        async fn record_view(&self, event: ViewEvent) -> Result<(), FeedError>;
    }
}

#[cfg(test)]
mockall::mock! {
    pub EngagementStore {}

    #[async_trait(?Send)]
    impl EngagementSink for EngagementStore {
        async fn apply(&self, mutation: EngagementMutation) -> Result<(), FeedError>;
    }
}
