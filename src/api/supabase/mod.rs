use crate::api::error::FeedError;
use crate::api::models::*;
use crate::api::ports::{ClipQuery, EngagementSink, ViewEventSink};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const CLIPS_TABLE: &str = "civic_clips";
const VIEWS_TABLE: &str = "civic_clip_views";
const LIKES_TABLE: &str = "civic_clip_likes";
const SAVES_TABLE: &str = "civic_clip_saves";

const POST_EMBED: &str = "id,title,content,created_at,votes_count,comment_count,\
author:profiles!posts_author_id_fkey(id,username,display_name,avatar_url),\
community:communities(id,name,display_name)";

/// Connection details for the managed Postgres REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

pub struct SupabaseClient {
    pub config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Self {
        Self { config }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self
            .config
            .access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .unwrap_or(&self.config.anon_key);
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    fn ensure_configured(&self) -> Result<(), FeedError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(FeedError::NotConfigured)
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<PostgrestError>(&body) {
        Ok(PostgrestError {
            message: Some(message),
            hint,
        }) => match hint.filter(|value| !value.trim().is_empty()) {
            Some(hint) => format!("{message} ({hint})"),
            None => message,
        },
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {}", body.trim()),
    }
}

include!("clip_queries.rs");
include!("views_and_engagement.rs");
