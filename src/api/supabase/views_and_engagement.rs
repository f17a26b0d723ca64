// Watch analytics inserts and like/save toggles.
#[derive(Debug, Serialize)]
struct ViewRow<'a> {
    clip_id: &'a str,
    user_id: Option<&'a str>,
    watch_duration: u64,
    watch_percentage: f64,
    completed: bool,
    device_type: DeviceType,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct EngagementRow<'a> {
    clip_id: &'a str,
    user_id: &'a str,
}

impl SupabaseClient {
    pub async fn insert_view(&self, event: &ViewEvent) -> Result<(), FeedError> {
        self.ensure_configured()?;
        let row = ViewRow {
            clip_id: &event.clip_id,
            user_id: event.user_id.as_deref(),
            watch_duration: event.watch_duration_seconds.max(0.0).floor() as u64,
            watch_percentage: event.watch_percentage,
            completed: event.completed,
            device_type: event.device_type,
            created_at: event.timestamp.to_rfc3339(),
        };
        let response = self
            .authorized(HTTP_CLIENT.post(self.table_url(VIEWS_TABLE)))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::AnalyticsDelivery(error_message(response).await));
        }
        Ok(())
    }

    async fn insert_engagement(&self, table: &str, user_id: &str, clip_id: &str) -> Result<(), FeedError> {
        let url = format!("{}?on_conflict=clip_id,user_id", self.table_url(table));
        let response = self
            .authorized(HTTP_CLIENT.post(&url))
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(&EngagementRow { clip_id, user_id })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::EngagementMutation(error_message(response).await));
        }
        Ok(())
    }

    async fn delete_engagement(&self, table: &str, user_id: &str, clip_id: &str) -> Result<(), FeedError> {
        let url = format!(
            "{}?clip_id=eq.{}&user_id=eq.{}",
            self.table_url(table),
            urlencoding::encode(clip_id),
            urlencoding::encode(user_id)
        );
        let response = self
            .authorized(HTTP_CLIENT.delete(&url))
            .header("Prefer", "return=minimal")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::EngagementMutation(error_message(response).await));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl ViewEventSink for SupabaseClient {
    async fn record_view(&self, event: ViewEvent) -> Result<(), FeedError> {
        self.insert_view(&event).await
    }
}

#[async_trait(?Send)]
impl EngagementSink for SupabaseClient {
    async fn apply(&self, mutation: EngagementMutation) -> Result<(), FeedError> {
        self.ensure_configured()?;
        let EngagementMutation {
            user_id,
            clip_id,
            kind,
        } = mutation;
        match kind {
            EngagementKind::Like => self.insert_engagement(LIKES_TABLE, &user_id, &clip_id).await,
            EngagementKind::Unlike => self.delete_engagement(LIKES_TABLE, &user_id, &clip_id).await,
            EngagementKind::Save => self.insert_engagement(SAVES_TABLE, &user_id, &clip_id).await,
            EngagementKind::Unsave => self.delete_engagement(SAVES_TABLE, &user_id, &clip_id).await,
        }
    }
}
