//! Paged clip list with serialized, sentinel-driven fetching.

use crate::api::{Clip, ClipFilters, ClipQuery, FeedError, FeedPage, PAGE_SIZE};
use std::rc::Rc;

/// Cards mounted behind and ahead of the active one.
pub const MOUNT_BEHIND: usize = 2;
pub const MOUNT_AHEAD: usize = 3;

/// A fetch the controller has agreed to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub cursor: u32,
    pub filters: ClipFilters,
}

/// One page from the query port, keeping only ready clips that match every filter.
pub async fn fetch_page<Q: ClipQuery + ?Sized>(
    query: &Q,
    cursor: u32,
    filters: &ClipFilters,
) -> Result<FeedPage, FeedError> {
    let rows = query.fetch_clips(filters, cursor).await?;
    let has_more = rows.len() as u32 >= PAGE_SIZE;
    let clips = rows
        .into_iter()
        .filter(|clip| clip.is_ready() && filters.matches(clip))
        .collect();
    Ok(FeedPage {
        clips,
        cursor,
        has_more,
    })
}

#[derive(Debug, Clone, Default)]
pub struct ClipFeedController {
    /// Shared with the cards so renders hand out pointers, not copies.
    clips: Vec<Rc<Clip>>,
    filters: ClipFilters,
    next_cursor: u32,
    has_more: bool,
    in_flight: Option<u64>,
    generation: u64,
    last_error: Option<String>,
    awaiting_sentinel_reset: bool,
    loaded_once: bool,
}

impl ClipFeedController {
    pub fn new(filters: ClipFilters) -> Self {
        Self {
            filters,
            has_more: true,
            ..Self::default()
        }
    }

    pub fn clips(&self) -> &[Rc<Clip>] {
        &self.clips
    }

    pub fn filters(&self) -> &ClipFilters {
        &self.filters
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True once the first page has come back, successfully or not.
    pub fn loaded_once(&self) -> bool {
        self.loaded_once
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Drops everything and starts a new generation for `filters`.
    pub fn reset(&mut self, filters: ClipFilters) {
        self.generation += 1;
        *self = Self {
            generation: self.generation,
            ..Self::new(filters)
        };
    }

    /// Called for every sentinel observation. Returns a request only when the
    /// sentinel is visible, nothing is outstanding and more pages exist.
    pub fn begin_fetch(&mut self, sentinel_visible: bool) -> Option<PageRequest> {
        if !sentinel_visible {
            self.awaiting_sentinel_reset = false;
            return None;
        }
        if self.in_flight.is_some() || !self.has_more || self.awaiting_sentinel_reset {
            return None;
        }
        self.in_flight = Some(self.generation);
        Some(PageRequest {
            generation: self.generation,
            cursor: self.next_cursor,
            filters: self.filters.clone(),
        })
    }

    /// Lifts the post-failure hold so the next visible sentinel fetches again.
    /// An empty feed keeps its sentinel on screen, so scrolling cannot do it.
    pub fn retry(&mut self) {
        self.awaiting_sentinel_reset = false;
    }

    /// Applies a finished fetch. Returns false when the result belonged to an
    /// older generation and was discarded.
    pub fn complete_fetch(
        &mut self,
        request: &PageRequest,
        result: Result<FeedPage, FeedError>,
    ) -> bool {
        if request.generation != self.generation || self.in_flight != Some(request.generation) {
            tracing::debug!(
                generation = request.generation,
                current = self.generation,
                "discarding stale clip page"
            );
            return false;
        }
        self.in_flight = None;
        self.loaded_once = true;

        match result {
            Ok(page) => {
                self.next_cursor = page.cursor + 1;
                self.has_more = page.has_more;
                self.last_error = None;
                self.clips.extend(page.clips.into_iter().map(Rc::new));
            }
            Err(err) => {
                tracing::warn!(cursor = request.cursor, error = %err, "clip page fetch failed");
                self.last_error = Some(err.to_string());
                self.awaiting_sentinel_reset = true;
            }
        }
        true
    }

    pub fn index_of(&self, clip_id: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.id == clip_id)
    }

    pub fn mount_window(&self, active_index: Option<usize>) -> std::ops::Range<usize> {
        let active = active_index.unwrap_or(0);
        let start = active.saturating_sub(MOUNT_BEHIND);
        let end = (active + MOUNT_AHEAD + 1).min(self.clips.len());
        start.min(end)..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::cell::{Cell, RefCell};

    fn clip(id: usize, status: &str, category: &str) -> Clip {
        Clip {
            id: format!("clip-{id}"),
            video_url: format!("https://cdn.example/{id}.mp4"),
            processing_status: status.to_string(),
            category: Some(category.to_string()),
            ..Clip::default()
        }
    }

    #[derive(Default)]
    struct FakeQuery {
        pages: RefCell<Vec<Vec<Clip>>>,
        calls: Cell<usize>,
        fail: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl ClipQuery for FakeQuery {
        async fn fetch_clips(
            &self,
            _filters: &ClipFilters,
            page_offset: u32,
        ) -> Result<Vec<Clip>, FeedError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(FeedError::PaginationFetch("offline".into()));
            }
            Ok(self
                .pages
                .borrow()
                .get(page_offset as usize)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn full_page(offset: usize) -> Vec<Clip> {
        (0..PAGE_SIZE as usize)
            .map(|i| clip(offset * 10 + i, "ready", "civic_education"))
            .collect()
    }

    #[tokio::test]
    async fn sentinel_issues_one_fetch_while_outstanding() {
        let query = FakeQuery::default();
        query.pages.borrow_mut().push(full_page(0));
        let mut feed = ClipFeedController::new(ClipFilters::default());

        let request = feed.begin_fetch(true).expect("first fetch");
        for _ in 0..5 {
            assert!(feed.begin_fetch(true).is_none());
        }
        let page = fetch_page(&query, request.cursor, &request.filters).await;
        assert!(feed.complete_fetch(&request, page));
        assert_eq!(query.calls.get(), 1);
        assert_eq!(feed.clips().len(), 10);
        assert!(feed.has_more());

        let next = feed.begin_fetch(true).expect("second page");
        assert_eq!(next.cursor, 1);
    }

    #[tokio::test]
    async fn loaded_clips_are_shared_across_pages() {
        let query = FakeQuery::default();
        query.pages.borrow_mut().push(full_page(0));
        query.pages.borrow_mut().push(full_page(1));
        let mut feed = ClipFeedController::new(ClipFilters::default());

        let request = feed.begin_fetch(true).unwrap();
        let page = fetch_page(&query, request.cursor, &request.filters).await;
        feed.complete_fetch(&request, page);
        let rendered = Rc::clone(&feed.clips()[3]);

        let request = feed.begin_fetch(true).unwrap();
        let page = fetch_page(&query, request.cursor, &request.filters).await;
        feed.complete_fetch(&request, page);
        assert_eq!(feed.clips().len(), 20);
        assert!(Rc::ptr_eq(&rendered, &feed.clips()[3]));
    }

    #[tokio::test]
    async fn short_page_ends_pagination() {
        let query = FakeQuery::default();
        query.pages.borrow_mut().push(vec![
            clip(1, "ready", "explainer"),
            clip(2, "processing", "explainer"),
        ]);
        let mut feed = ClipFeedController::new(ClipFilters::default());
        let request = feed.begin_fetch(true).unwrap();
        let page = fetch_page(&query, request.cursor, &request.filters).await;
        feed.complete_fetch(&request, page);

        assert_eq!(feed.clips().len(), 1);
        assert!(!feed.has_more());
        assert!(feed.begin_fetch(true).is_none());
    }

    #[tokio::test]
    async fn filters_are_rechecked_client_side() {
        let query = FakeQuery::default();
        query.pages.borrow_mut().push(vec![
            clip(1, "ready", "explainer"),
            clip(2, "ready", "watchdog"),
        ]);
        let page = fetch_page(&query, 0, &ClipFilters::category("watchdog"))
            .await
            .unwrap();
        assert_eq!(page.clips.len(), 1);
        assert_eq!(page.clips[0].id, "clip-2");
    }

    #[tokio::test]
    async fn failure_waits_for_sentinel_to_leave_and_return() {
        let query = FakeQuery::default();
        query.fail.set(true);
        let mut feed = ClipFeedController::new(ClipFilters::default());

        let request = feed.begin_fetch(true).unwrap();
        let page = fetch_page(&query, request.cursor, &request.filters).await;
        assert!(matches!(page, Err(FeedError::PaginationFetch(_))));
        feed.complete_fetch(&request, page);
        assert!(feed.last_error().is_some());
        assert!(feed.loaded_once());

        assert!(feed.begin_fetch(true).is_none());
        assert!(feed.begin_fetch(false).is_none());
        let retry = feed.begin_fetch(true).expect("retry after re-scroll");
        assert_eq!(retry.cursor, 0);
    }

    #[tokio::test]
    async fn failed_first_page_recovers_through_retry() {
        let query = FakeQuery::default();
        query.fail.set(true);
        let mut feed = ClipFeedController::new(ClipFilters::default());

        let request = feed.begin_fetch(true).unwrap();
        let page = fetch_page(&query, request.cursor, &request.filters).await;
        feed.complete_fetch(&request, page);
        assert!(feed.is_empty());

        // The sentinel of an empty feed never leaves the viewport.
        for _ in 0..1000 {
            assert!(feed.begin_fetch(true).is_none());
        }

        query.fail.set(false);
        query.pages.borrow_mut().push(full_page(0));
        feed.retry();
        let again = feed.begin_fetch(true).expect("fetch after retry");
        assert_eq!(again.cursor, 0);
        let page = fetch_page(&query, again.cursor, &again.filters).await;
        assert!(feed.complete_fetch(&again, page));
        assert_eq!(feed.clips().len(), 10);
        assert!(feed.last_error().is_none());
    }

    #[test]
    fn reset_discards_stale_completions() {
        let mut feed = ClipFeedController::new(ClipFilters::default());
        let stale = feed.begin_fetch(true).unwrap();
        feed.reset(ClipFilters::hashtag("roads"));

        let page = FeedPage {
            clips: vec![clip(1, "ready", "explainer")],
            cursor: 0,
            has_more: false,
        };
        assert!(!feed.complete_fetch(&stale, Ok(page)));
        assert!(feed.is_empty());
        assert_eq!(feed.filters().hashtag.as_deref(), Some("roads"));

        let fresh = feed.begin_fetch(true).unwrap();
        assert!(fresh.generation > stale.generation);
    }

    #[test]
    fn mount_window_spans_two_behind_three_ahead() {
        let mut feed = ClipFeedController::new(ClipFilters::default());
        let request = feed.begin_fetch(true).unwrap();
        let page = FeedPage {
            clips: (0..10).map(|i| clip(i, "ready", "explainer")).collect(),
            cursor: 0,
            has_more: true,
        };
        feed.complete_fetch(&request, Ok(page));

        assert_eq!(feed.mount_window(None), 0..4);
        assert_eq!(feed.mount_window(Some(5)), 3..9);
        assert_eq!(feed.mount_window(Some(9)), 7..10);
        assert!(feed.mount_window(Some(5)).contains(&3));
        assert!(!feed.mount_window(Some(5)).contains(&2));
        assert_eq!(feed.index_of("clip-4"), Some(4));
    }
}
