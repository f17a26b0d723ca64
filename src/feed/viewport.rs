//! Geometry sampling for the feed's scroll container.
//!
//! The UI polls card geometry on an interval and hands [`ViewportSnapshot`]s to
//! [`ViewportTracker`], which reports intersection-style changes: a card shows
//! up in a batch only when it crosses the visibility threshold.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Fraction of a card that must be inside the scroll container to count as visible.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;
pub const VIEWPORT_POLL_MS: u32 = 150;

#[derive(Debug, Clone, PartialEq)]
pub struct CardGeometry {
    pub id: String,
    pub ratio: f64,
    pub in_preload: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportSnapshot {
    pub page_hidden: bool,
    pub sentinel_visible: bool,
    pub cards: Vec<CardGeometry>,
}

/// Vertical extent of an element in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Span {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardSpan {
    pub id: String,
    #[serde(flatten)]
    pub span: Span,
}

/// Raw geometry read from the DOM in one pass.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FeedGeometry {
    #[serde(default)]
    pub page_hidden: bool,
    #[serde(default)]
    pub root: Span,
    #[serde(default)]
    pub sentinel: Option<Span>,
    #[serde(default)]
    pub cards: Vec<CardSpan>,
}

impl FeedGeometry {
    pub fn snapshot(&self, preload_margin: f64) -> ViewportSnapshot {
        let root = self.root;
        ViewportSnapshot {
            page_hidden: self.page_hidden,
            sentinel_visible: self
                .sentinel
                .map(|s| within_margin(s.top, s.bottom, root.top, root.bottom, 0.0))
                .unwrap_or(false),
            cards: self
                .cards
                .iter()
                .map(|card| CardGeometry {
                    id: card.id.clone(),
                    ratio: visibility_ratio(card.span.top, card.span.bottom, root.top, root.bottom),
                    in_preload: within_margin(
                        card.span.top,
                        card.span.bottom,
                        root.top,
                        root.bottom,
                        preload_margin,
                    ),
                })
                .collect(),
        }
    }
}

/// One card crossing the threshold in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub clip_id: String,
    pub ratio: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportChanges {
    pub crossings: Vec<Crossing>,
    /// Cards that entered the preload margin for the first time.
    pub preloaded: Vec<String>,
    /// Cards that were sampled before and are gone now.
    pub unmounted: Vec<String>,
    pub sentinel_visible: Option<bool>,
    pub page_visible: Option<bool>,
}

/// Visible fraction of `[top, bottom)` inside `[root_top, root_bottom)`.
pub fn visibility_ratio(top: f64, bottom: f64, root_top: f64, root_bottom: f64) -> f64 {
    let height = bottom - top;
    if !(height > 0.0) {
        return 0.0;
    }
    let overlap = bottom.min(root_bottom) - top.max(root_top);
    (overlap / height).clamp(0.0, 1.0)
}

/// Whether `[top, bottom)` lies within `margin` root heights of the root.
pub fn within_margin(top: f64, bottom: f64, root_top: f64, root_bottom: f64, margin: f64) -> bool {
    let extra = (root_bottom - root_top).max(0.0) * margin.max(0.0);
    bottom > root_top - extra && top < root_bottom + extra
}

#[derive(Debug, Clone, Default)]
pub struct ViewportTracker {
    visible: HashMap<String, bool>,
    preloaded: HashSet<String>,
    sentinel_visible: Option<bool>,
    page_visible: Option<bool>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, snapshot: &ViewportSnapshot) -> ViewportChanges {
        let mut changes = ViewportChanges::default();

        let page_visible = !snapshot.page_hidden;
        if self.page_visible != Some(page_visible) {
            self.page_visible = Some(page_visible);
            changes.page_visible = Some(page_visible);
        }
        if self.sentinel_visible != Some(snapshot.sentinel_visible) {
            self.sentinel_visible = Some(snapshot.sentinel_visible);
            changes.sentinel_visible = Some(snapshot.sentinel_visible);
        }

        let mut seen = HashSet::with_capacity(snapshot.cards.len());
        for card in &snapshot.cards {
            seen.insert(card.id.as_str());
            let visible = card.ratio >= VISIBILITY_THRESHOLD;
            let previous = self.visible.insert(card.id.clone(), visible);
            // First sighting is reported only when visible, like an observer's
            // initial callback for an element that starts on screen.
            let crossed = match previous {
                Some(was) => was != visible,
                None => visible,
            };
            if crossed {
                changes.crossings.push(Crossing {
                    clip_id: card.id.clone(),
                    ratio: card.ratio,
                    visible,
                });
            }
            if (card.in_preload || visible) && self.preloaded.insert(card.id.clone()) {
                changes.preloaded.push(card.id.clone());
            }
        }

        let gone: Vec<String> = self
            .visible
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        for id in gone {
            self.visible.remove(&id);
            self.preloaded.remove(&id);
            changes.unmounted.push(id);
        }
        changes.unmounted.sort();

        changes
    }

    /// Forgets that `id` was preloaded so its next in-margin sample reports it again.
    pub fn release(&mut self, id: &str) {
        self.preloaded.remove(id);
    }
}

/// Folds newly preloaded cards into `preloaded`, keeping only cards inside the
/// mount window. Cards outside it are released so they preload again once a
/// player is back and they are near the viewport. Returns whether the set changed.
pub fn sync_preloaded(
    viewport: &mut ViewportTracker,
    preloaded: &mut HashSet<String>,
    changes: &ViewportChanges,
    mounted: &HashSet<&str>,
) -> bool {
    let mut changed = false;
    for id in &changes.unmounted {
        changed |= preloaded.remove(id);
    }
    for id in &changes.preloaded {
        if mounted.contains(id.as_str()) {
            changed |= preloaded.insert(id.clone());
        } else {
            viewport.release(id);
        }
    }
    let stale: Vec<String> = preloaded
        .iter()
        .filter(|id| !mounted.contains(id.as_str()))
        .cloned()
        .collect();
    for id in stale {
        viewport.release(&id);
        preloaded.remove(&id);
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, ratio: f64) -> CardGeometry {
        CardGeometry {
            id: id.to_string(),
            ratio,
            in_preload: ratio > 0.0,
        }
    }

    fn snapshot(cards: Vec<CardGeometry>) -> ViewportSnapshot {
        ViewportSnapshot {
            page_hidden: false,
            sentinel_visible: false,
            cards,
        }
    }

    #[test]
    fn ratio_and_margin_geometry() {
        assert_eq!(visibility_ratio(0.0, 100.0, 0.0, 100.0), 1.0);
        assert_eq!(visibility_ratio(40.0, 140.0, 0.0, 100.0), 0.6);
        assert_eq!(visibility_ratio(200.0, 300.0, 0.0, 100.0), 0.0);
        assert_eq!(visibility_ratio(10.0, 10.0, 0.0, 100.0), 0.0);
        assert!(within_margin(150.0, 250.0, 0.0, 100.0, 1.0));
        assert!(!within_margin(250.0, 350.0, 0.0, 100.0, 1.0));
    }

    #[test]
    fn only_threshold_changes_are_reported() {
        let mut tracker = ViewportTracker::new();
        let first = tracker.observe(&snapshot(vec![card("a", 1.0), card("b", 0.0)]));
        assert_eq!(first.crossings.len(), 1);
        assert_eq!(first.crossings[0].clip_id, "a");
        assert_eq!(first.page_visible, Some(true));
        assert_eq!(first.sentinel_visible, Some(false));
        assert_eq!(first.preloaded, vec!["a".to_string()]);

        let same = tracker.observe(&snapshot(vec![card("a", 0.9), card("b", 0.1)]));
        assert!(same.crossings.is_empty());
        assert_eq!(same.preloaded, vec!["b".to_string()]);

        let swapped = tracker.observe(&snapshot(vec![card("a", 0.4), card("b", 0.6)]));
        assert_eq!(swapped.crossings.len(), 2);
        assert!(!swapped.crossings[0].visible);
        assert!(swapped.crossings[1].visible);
    }

    #[test]
    fn missing_cards_are_unmounted_and_page_visibility_changes() {
        let mut tracker = ViewportTracker::new();
        tracker.observe(&snapshot(vec![card("a", 1.0), card("b", 0.2)]));
        let mut hidden = snapshot(vec![card("a", 1.0)]);
        hidden.page_hidden = true;
        let changes = tracker.observe(&hidden);
        assert_eq!(changes.unmounted, vec!["b".to_string()]);
        assert_eq!(changes.page_visible, Some(false));
        assert_eq!(tracker.observe(&hidden), ViewportChanges::default());
    }

    #[test]
    fn preload_set_follows_the_mount_window() {
        let mut tracker = ViewportTracker::new();
        let mut preloaded = HashSet::new();
        let cards = snapshot(vec![card("a", 1.0), card("b", 0.2)]);

        let changes = tracker.observe(&cards);
        let both: HashSet<&str> = ["a", "b"].into_iter().collect();
        assert!(sync_preloaded(&mut tracker, &mut preloaded, &changes, &both));
        assert_eq!(preloaded.len(), 2);

        // "a" keeps its placeholder in the DOM but loses its player.
        let only_b: HashSet<&str> = ["b"].into_iter().collect();
        let changes = tracker.observe(&cards);
        assert!(sync_preloaded(&mut tracker, &mut preloaded, &changes, &only_b));
        assert!(!preloaded.contains("a"));

        let changes = tracker.observe(&cards);
        assert!(!sync_preloaded(&mut tracker, &mut preloaded, &changes, &only_b));
        assert!(!preloaded.contains("a"));

        // Back in the window and still near the viewport: preload again.
        let changes = tracker.observe(&cards);
        assert_eq!(changes.preloaded, vec!["a".to_string()]);
        assert!(sync_preloaded(&mut tracker, &mut preloaded, &changes, &both));
        assert!(preloaded.contains("a"));
    }

    #[test]
    fn geometry_payload_becomes_snapshot() {
        let geometry: FeedGeometry = serde_json::from_str(
            r#"{"page_hidden":false,"root":{"top":0,"bottom":800},
                "sentinel":{"top":799,"bottom":800},
                "cards":[{"id":"c1","top":-200,"bottom":600},{"id":"c2","top":600,"bottom":1400},
                         {"id":"c3","top":1400,"bottom":2200},{"id":"c4","top":2200,"bottom":3000}]}"#,
        )
        .unwrap();
        let snapshot = geometry.snapshot(1.0);
        assert!(snapshot.sentinel_visible);
        assert_eq!(snapshot.cards[0].ratio, 0.75);
        assert_eq!(snapshot.cards[1].ratio, 0.25);
        assert!(snapshot.cards[2].in_preload);
        assert!(!snapshot.cards[3].in_preload);

        let offscreen = FeedGeometry {
            sentinel: Some(Span { top: 900.0, bottom: 901.0 }),
            ..geometry
        };
        assert!(!offscreen.snapshot(1.0).sentinel_visible);
    }
}
