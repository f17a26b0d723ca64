use std::fmt;
use std::rc::Rc;
use tokio::sync::watch;

/// Feed-wide mute flag. Every mounted player holds a clone and reads the same
/// value; writes publish to subscribers only when the value actually changes.
#[derive(Clone)]
pub struct MuteBroadcastState(Rc<watch::Sender<bool>>);

impl MuteBroadcastState {
    pub fn new(muted: bool) -> Self {
        let (sender, _receiver) = watch::channel(muted);
        Self(Rc::new(sender))
    }

    pub fn get(&self) -> bool {
        *self.0.borrow()
    }

    /// Returns true when the stored value changed.
    pub fn set(&self, muted: bool) -> bool {
        self.0.send_if_modified(|current| {
            if *current == muted {
                false
            } else {
                *current = muted;
                true
            }
        })
    }

    pub fn toggle(&self) -> bool {
        let next = !self.get();
        self.set(next);
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

impl PartialEq for MuteBroadcastState {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MuteBroadcastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MuteBroadcastState").field(&self.get()).finish()
    }
}

impl Default for MuteBroadcastState {
    fn default() -> Self {
        Self::new(true)
    }
}
