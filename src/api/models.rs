use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Rows per feed page.
pub const PAGE_SIZE: u32 = 10;
/// Only clips in this processing state are eligible for the feed.
pub const READY_STATUS: &str = "ready";
/// Watch percentage at which a view counts as completed.
pub const COMPLETED_PERCENTAGE: f64 = 90.0;

// PostgREST sends explicit nulls for empty arrays and counters.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClipAuthor {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClipCommunity {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// The post a clip was published with. Only used for overlay rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostSummary {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, alias = "content")]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author: Option<ClipAuthor>,
    #[serde(default)]
    pub community: Option<ClipCommunity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub post_id: Option<String>,
    pub video_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fallback_urls: Vec<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processing_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments_count: u32,
    #[serde(default)]
    pub fact_check_status: Option<String>,
    #[serde(default)]
    pub official_response_status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_sources: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub post: Option<PostSummary>,
}

impl Clip {
    pub fn is_ready(&self) -> bool {
        self.processing_status == READY_STATUS
    }

    pub fn post_id(&self) -> Option<&str> {
        self.post_id
            .as_deref()
            .or_else(|| self.post.as_ref().map(|post| post.id.as_str()))
            .filter(|id| !id.trim().is_empty())
    }

    pub fn author(&self) -> Option<&ClipAuthor> {
        self.post.as_ref().and_then(|post| post.author.as_ref())
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author().map(|author| author.id.as_str())
    }

    /// Likes shown on the card; older rows only carry the post vote count.
    pub fn like_count(&self) -> u32 {
        if self.likes_count > 0 {
            return self.likes_count;
        }
        self.post.as_ref().map(|post| post.votes_count).unwrap_or(0)
    }

    pub fn comment_count(&self) -> u32 {
        if self.comments_count > 0 {
            return self.comments_count;
        }
        self.post.as_ref().map(|post| post.comment_count).unwrap_or(0)
    }

    /// Hashtags rendered on the overlay plus how many were left out.
    pub fn visible_hashtags(&self, limit: usize) -> (&[String], usize) {
        let shown = self.hashtags.len().min(limit);
        (&self.hashtags[..shown], self.hashtags.len() - shown)
    }
}

/// Optional predicates for a feed; every supplied one must match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClipFilters {
    pub category: Option<String>,
    pub hashtag: Option<String>,
    pub author_id: Option<String>,
}

impl ClipFilters {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn hashtag(tag: impl Into<String>) -> Self {
        Self {
            hashtag: Some(tag.into().trim_start_matches('#').to_string()),
            ..Self::default()
        }
    }

    pub fn author(author_id: impl Into<String>) -> Self {
        Self {
            author_id: Some(author_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, clip: &Clip) -> bool {
        if let Some(category) = self.category.as_deref() {
            if clip.category.as_deref() != Some(category) {
                return false;
            }
        }
        if let Some(tag) = self.hashtag.as_deref() {
            if !clip.hashtags.iter().any(|candidate| candidate == tag) {
                return false;
            }
        }
        if let Some(author_id) = self.author_id.as_deref() {
            if clip.author_id() != Some(author_id) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedPage {
    pub clips: Vec<Clip>,
    /// Zero-based page offset this page was fetched at.
    pub cursor: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.to_ascii_lowercase().contains("mobile") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn current() -> Self {
        web_sys::window()
            .and_then(|window| window.navigator().user_agent().ok())
            .map(|agent| Self::from_user_agent(&agent))
            .unwrap_or(Self::Desktop)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn current() -> Self {
        if cfg!(any(target_os = "ios", target_os = "android")) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEvent {
    pub clip_id: String,
    pub user_id: Option<String>,
    pub watch_duration_seconds: f64,
    pub watch_percentage: f64,
    pub completed: bool,
    pub device_type: DeviceType,
    pub timestamp: DateTime<Utc>,
}

impl ViewEvent {
    pub fn new(
        clip_id: impl Into<String>,
        user_id: Option<String>,
        watch_duration_seconds: f64,
        watch_percentage: f64,
        device_type: DeviceType,
    ) -> Self {
        let watch_percentage = if watch_percentage.is_finite() {
            watch_percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let watch_duration_seconds = if watch_duration_seconds.is_finite() {
            watch_duration_seconds.max(0.0)
        } else {
            0.0
        };
        Self {
            clip_id: clip_id.into(),
            user_id,
            watch_duration_seconds,
            watch_percentage,
            completed: watch_percentage >= COMPLETED_PERCENTAGE,
            device_type,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementKind {
    Like,
    Unlike,
    Save,
    Unsave,
}

/// One idempotent write against the engagement sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMutation {
    pub user_id: String,
    pub clip_id: String,
    pub kind: EngagementKind,
}

pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_json() -> serde_json::Value {
        serde_json::json!({
            "id": "clip-1",
            "post_id": null,
            "video_url": "https://cdn.example/clip-1.mp4",
            "fallback_urls": null,
            "thumbnail_url": "https://cdn.example/clip-1.jpg",
            "duration": 42.5,
            "category": "civic_education",
            "hashtags": ["budget", "county", "roads", "water"],
            "processing_status": "ready",
            "views_count": null,
            "post": {
                "id": "post-9",
                "title": "Where the roads budget went",
                "content": "A quick breakdown",
                "votes_count": 7,
                "author": { "id": "user-3", "username": "wanjiku", "display_name": "Wanjiku" },
                "community": { "id": "c-1", "name": "nairobi", "display_name": null }
            }
        })
    }

    #[test]
    fn decodes_postgrest_row_with_nulls() {
        let clip: Clip = serde_json::from_value(clip_json()).unwrap();
        assert!(clip.is_ready());
        assert!(clip.fallback_urls.is_empty());
        assert_eq!(clip.views_count, 0);
        assert_eq!(clip.post_id(), Some("post-9"));
        assert_eq!(clip.author_id(), Some("user-3"));
        assert_eq!(clip.like_count(), 7);
        assert_eq!(clip.post.as_ref().unwrap().text.as_deref(), Some("A quick breakdown"));
    }

    #[test]
    fn visible_hashtags_reports_overflow() {
        let clip: Clip = serde_json::from_value(clip_json()).unwrap();
        let (shown, extra) = clip.visible_hashtags(3);
        assert_eq!(shown, ["budget", "county", "roads"]);
        assert_eq!(extra, 1);
    }

    #[test]
    fn filters_require_every_predicate() {
        let clip: Clip = serde_json::from_value(clip_json()).unwrap();
        assert!(ClipFilters::default().matches(&clip));
        assert!(ClipFilters::category("civic_education").matches(&clip));
        assert!(ClipFilters::hashtag("#roads").matches(&clip));
        assert!(ClipFilters::author("user-3").matches(&clip));

        let mixed = ClipFilters {
            category: Some("civic_education".into()),
            hashtag: Some("health".into()),
            author_id: None,
        };
        assert!(!mixed.matches(&clip));
    }

    #[test]
    fn view_event_clamps_and_marks_completion() {
        let over = ViewEvent::new("c", None, 31.0, 104.0, DeviceType::Desktop);
        assert_eq!(over.watch_percentage, 100.0);
        assert!(over.completed);

        let under = ViewEvent::new("c", None, -2.0, -5.0, DeviceType::Mobile);
        assert_eq!(under.watch_percentage, 0.0);
        assert_eq!(under.watch_duration_seconds, 0.0);
        assert!(!under.completed);

        let edge = ViewEvent::new("c", Some("u".into()), 9.0, 90.0, DeviceType::Desktop);
        assert!(edge.completed);
        let nan = ViewEvent::new("c", None, f64::NAN, f64::NAN, DeviceType::Desktop);
        assert_eq!(nan.watch_percentage, 0.0);
    }

    #[test]
    fn device_type_from_user_agent() {
        let phone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile/15E148 Safari/604.1";
        assert_eq!(DeviceType::from_user_agent(phone), DeviceType::Mobile);
        let laptop = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";
        assert_eq!(DeviceType::from_user_agent(laptop), DeviceType::Desktop);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.9), "1:05");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }
}
