// Feed page queries against the civic clips table.

/// Single-element Postgres array literal with the element quoted, so commas and
/// braces inside a tag cannot split or close the array.
fn quoted_array_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{{\"{escaped}\"}}")
}

impl SupabaseClient {
    /// Builds the PostgREST URL for one page of ready clips, newest first.
    pub fn clips_query_url(&self, filters: &ClipFilters, page_offset: u32) -> String {
        // An author filter targets the embedded post, which needs an inner join
        // so non-matching clips drop out instead of arriving with `post: null`.
        let join = if filters.author_id.is_some() {
            "!inner"
        } else {
            ""
        };
        let mut url = format!(
            "{}?select=*,post:posts!civic_clips_post_id_fkey{}({})&processing_status=eq.{}&order=created_at.desc&offset={}&limit={}",
            self.table_url(CLIPS_TABLE),
            join,
            POST_EMBED,
            READY_STATUS,
            page_offset.saturating_mul(PAGE_SIZE),
            PAGE_SIZE,
        );

        if let Some(category) = filters.category.as_deref() {
            url.push_str(&format!("&category=eq.{}", urlencoding::encode(category)));
        }
        if let Some(tag) = filters.hashtag.as_deref() {
            url.push_str(&format!(
                "&hashtags=cs.{}",
                urlencoding::encode(&quoted_array_literal(tag))
            ));
        }
        if let Some(author_id) = filters.author_id.as_deref() {
            url.push_str(&format!(
                "&post.author_id=eq.{}",
                urlencoding::encode(author_id)
            ));
        }

        url
    }

    pub async fn get_clips_page(
        &self,
        filters: &ClipFilters,
        page_offset: u32,
    ) -> Result<Vec<Clip>, FeedError> {
        self.ensure_configured()?;
        let url = self.clips_query_url(filters, page_offset);
        let response = self.authorized(HTTP_CLIENT.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::PaginationFetch(error_message(response).await));
        }

        let body = response.text().await?;
        let clips: Vec<Clip> = serde_json::from_str(&body)?;
        Ok(clips)
    }
}

#[async_trait(?Send)]
impl ClipQuery for SupabaseClient {
    async fn fetch_clips(
        &self,
        filters: &ClipFilters,
        page_offset: u32,
    ) -> Result<Vec<Clip>, FeedError> {
        self.get_clips_page(filters, page_offset).await
    }
}
