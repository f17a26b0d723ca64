use super::viewport::Crossing;

/// Picks the single clip that may play. Fed with crossing batches from the
/// viewport sampler and with mount/unmount notifications from the cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveClipTracker {
    active: Option<String>,
    mounted: Vec<String>,
}

impl ActiveClipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, clip_id: &str) -> bool {
        self.active.as_deref() == Some(clip_id)
    }

    pub fn mount(&mut self, clip_id: &str) {
        if !self.mounted.iter().any(|id| id == clip_id) {
            self.mounted.push(clip_id.to_string());
        }
    }

    pub fn unmount(&mut self, clip_id: &str) {
        self.mounted.retain(|id| id != clip_id);
        if self.is_active(clip_id) {
            self.active = None;
        }
    }

    /// Applies one batch and returns true when the active clip changed.
    pub fn observe(&mut self, batch: &[Crossing]) -> bool {
        let entering: Vec<&Crossing> = batch
            .iter()
            .filter(|entry| entry.visible && self.mounted.contains(&entry.clip_id))
            .collect();

        let next = match entering.as_slice() {
            [] => return false,
            [single] => single.clip_id.clone(),
            several if self.active.is_none() => {
                let mut best = several[0];
                for entry in &several[1..] {
                    if entry.ratio > best.ratio {
                        best = *entry;
                    }
                }
                best.clip_id.clone()
            }
            _ => return false,
        };

        if self.active.as_deref() == Some(next.as_str()) {
            return false;
        }
        tracing::debug!(clip_id = %next, "active clip changed");
        self.active = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enter(id: &str, ratio: f64) -> Crossing {
        Crossing {
            clip_id: id.to_string(),
            ratio,
            visible: true,
        }
    }

    fn leave(id: &str) -> Crossing {
        Crossing {
            clip_id: id.to_string(),
            ratio: 0.1,
            visible: false,
        }
    }

    fn mounted(ids: &[&str]) -> ActiveClipTracker {
        let mut tracker = ActiveClipTracker::new();
        for id in ids {
            tracker.mount(id);
        }
        tracker
    }

    #[test]
    fn single_crossing_becomes_active() {
        let mut tracker = mounted(&["c0", "c1", "c2"]);
        assert!(tracker.observe(&[enter("c0", 1.0)]));
        assert!(tracker.observe(&[leave("c0"), enter("c1", 0.6)]));
        assert_eq!(tracker.active(), Some("c1"));
        assert!(!tracker.is_active("c0"));
        assert!(!tracker.is_active("c2"));
    }

    #[test]
    fn several_crossings_keep_previous_active() {
        let mut tracker = mounted(&["c0", "c1", "c2"]);
        tracker.observe(&[enter("c0", 1.0)]);
        assert!(!tracker.observe(&[enter("c1", 0.7), enter("c2", 0.9)]));
        assert_eq!(tracker.active(), Some("c0"));
        assert!(tracker.observe(&[enter("c2", 0.9)]));
        assert_eq!(tracker.active(), Some("c2"));
    }

    #[test]
    fn first_batch_with_several_entries_picks_highest_ratio() {
        let mut tracker = mounted(&["c0", "c1", "c2"]);
        tracker.observe(&[enter("c0", 0.6), enter("c1", 0.8), enter("c2", 0.8)]);
        assert_eq!(tracker.active(), Some("c1"));
    }

    #[test]
    fn unmounting_active_clears_until_next_crossing() {
        let mut tracker = mounted(&["c0", "c1"]);
        tracker.observe(&[enter("c0", 1.0)]);
        tracker.unmount("c1");
        assert_eq!(tracker.active(), Some("c0"));
        tracker.unmount("c0");
        assert_eq!(tracker.active(), None);
        assert!(!tracker.observe(&[enter("c0", 1.0)]));

        tracker.mount("c1");
        assert!(tracker.observe(&[enter("c1", 1.0)]));
    }

    #[test]
    fn never_more_than_one_active() {
        let mut tracker = mounted(&["a", "b", "c", "d"]);
        let batches = vec![
            vec![enter("a", 1.0)],
            vec![enter("b", 0.6), enter("c", 0.7)],
            vec![leave("a"), enter("d", 0.55)],
            vec![leave("d")],
            vec![enter("b", 0.9)],
        ];
        for batch in batches {
            tracker.observe(&batch);
            let active: Vec<_> = ["a", "b", "c", "d"]
                .into_iter()
                .filter(|id| tracker.is_active(id))
                .collect();
            assert!(active.len() <= 1);
        }
        assert_eq!(tracker.active(), Some("b"));
    }
}
