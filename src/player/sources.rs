//! Ordered media candidates for one clip and the bounded plan that walks them.

/// Hard cap on load attempts per mounted player.
pub const MAX_RETRIES: u32 = 3;

const RESOLVER_VARIANTS: [&str; 2] = ["protocol=h2", "protocol=h2&cache-control=no-cache"];

fn with_query(url: &str, extra: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{extra}")
}

/// Primary URL, then the clip's explicit fallbacks, then transport variants of
/// the primary. Blank entries are skipped and duplicates keep their first slot.
pub fn candidate_urls(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let primary = primary.trim();
    let mut ordered: Vec<String> = Vec::with_capacity(1 + fallbacks.len() + RESOLVER_VARIANTS.len());

    let mut push = |url: String| {
        if !url.is_empty() && !ordered.contains(&url) {
            ordered.push(url);
        }
    };

    push(primary.to_string());
    for fallback in fallbacks {
        push(fallback.trim().to_string());
    }
    if !primary.is_empty() {
        for variant in RESOLVER_VARIANTS {
            push(with_query(primary, variant));
        }
    }
    ordered
}

/// What to do after a hard load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    TryNext(String),
    GiveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    candidates: Vec<String>,
    cursor: usize,
    attempts: u32,
}

impl LoadPlan {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            cursor: 0,
            attempts: 0,
        }
    }

    pub fn for_clip(primary: &str, fallbacks: &[String]) -> Self {
        Self::new(candidate_urls(primary, fallbacks))
    }

    pub fn current(&self) -> Option<&str> {
        if self.exhausted() {
            return None;
        }
        self.candidates.get(self.cursor).map(String::as_str)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn exhausted(&self) -> bool {
        self.attempts >= MAX_RETRIES || self.cursor >= self.candidates.len()
    }

    /// Records a failed attempt on the current candidate and picks the next one.
    pub fn record_failure(&mut self) -> RetryDecision {
        if self.exhausted() {
            return RetryDecision::GiveUp;
        }
        self.attempts += 1;
        self.cursor += 1;
        match self.current() {
            Some(url) => RetryDecision::TryNext(url.to_string()),
            None => RetryDecision::GiveUp,
        }
    }
}
