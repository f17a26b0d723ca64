//! Per-card like/save state with optimistic counters.

use crate::api::{Clip, EngagementKind, EngagementMutation, EngagementSink};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngagementState {
    pub liked: bool,
    pub saved: bool,
    pub like_count: u32,
}

impl EngagementState {
    pub fn for_clip(clip: &Clip) -> Self {
        Self {
            liked: false,
            saved: false,
            like_count: clip.like_count(),
        }
    }

    /// Flips the like locally and returns the write to send, or `None` when
    /// there is no signed-in user.
    pub fn toggle_like(&mut self, user_id: Option<&str>, clip_id: &str) -> Option<EngagementMutation> {
        let user_id = signed_in(user_id)?;
        let kind = if self.liked {
            self.like_count = self.like_count.saturating_sub(1);
            EngagementKind::Unlike
        } else {
            self.like_count = self.like_count.saturating_add(1);
            EngagementKind::Like
        };
        self.liked = !self.liked;
        Some(EngagementMutation {
            user_id: user_id.to_string(),
            clip_id: clip_id.to_string(),
            kind,
        })
    }

    pub fn toggle_save(&mut self, user_id: Option<&str>, clip_id: &str) -> Option<EngagementMutation> {
        let user_id = signed_in(user_id)?;
        let kind = if self.saved {
            EngagementKind::Unsave
        } else {
            EngagementKind::Save
        };
        self.saved = !self.saved;
        Some(EngagementMutation {
            user_id: user_id.to_string(),
            clip_id: clip_id.to_string(),
            kind,
        })
    }
}

fn signed_in(user_id: Option<&str>) -> Option<&str> {
    user_id.map(str::trim).filter(|id| !id.is_empty())
}

/// Sends one mutation. The optimistic local state is kept even when this fails.
pub async fn persist<S: EngagementSink + ?Sized>(sink: &S, mutation: EngagementMutation) -> bool {
    let kind = mutation.kind;
    let clip_id = mutation.clip_id.clone();
    match sink.apply(mutation).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(clip_id = %clip_id, ?kind, error = %err, "engagement update failed");
            false
        }
    }
}

pub fn share_url(origin: &str, post_id: &str) -> String {
    format!("{}/post/{}", origin.trim_end_matches('/'), post_id)
}
