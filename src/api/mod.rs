pub mod error;
pub mod models;
pub mod ports;
pub mod supabase;

pub use error::FeedError;
pub use models::*;
pub use ports::{ClipQuery, EngagementSink, ViewEventSink};
pub use supabase::{SupabaseClient, SupabaseConfig};
