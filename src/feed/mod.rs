pub mod controller;
pub mod engagement;
pub mod tracker;
pub mod viewport;

pub use controller::{fetch_page, ClipFeedController};
pub use engagement::{share_url, EngagementState};
pub use tracker::ActiveClipTracker;
pub use viewport::ViewportTracker;
