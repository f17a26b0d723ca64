use crate::api::SupabaseConfig;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use gloo_storage::{errors::StorageError, LocalStorage, Storage};

/// Error type for settings storage on native platforms
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DbError(String);

#[cfg(not(target_arch = "wasm32"))]
impl DbError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[cfg(target_arch = "wasm32")]
const SETTINGS_KEY: &str = "civicclips.feed_settings";

const DEFAULT_SUPABASE_URL: Option<&str> = option_env!("CIVICCLIPS_SUPABASE_URL");
const DEFAULT_SUPABASE_ANON_KEY: Option<&str> = option_env!("CIVICCLIPS_SUPABASE_ANON_KEY");

/// Feed settings persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    #[serde(default = "default_supabase_anon_key")]
    pub supabase_anon_key: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_true")]
    pub loop_clips: bool,
    #[serde(default = "default_true")]
    pub start_muted: bool,
    #[serde(default)]
    pub show_accountability: bool,
    /// Distance outside the scroll viewport, in viewport heights, at which a
    /// card starts loading its media.
    #[serde(default = "default_preload_margin")]
    pub preload_margin: f64,
}

fn default_true() -> bool {
    true
}

fn default_preload_margin() -> f64 {
    1.0
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.unwrap_or_default().to_string()
}

fn default_supabase_anon_key() -> String {
    DEFAULT_SUPABASE_ANON_KEY.unwrap_or_default().to_string()
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            supabase_url: default_supabase_url(),
            supabase_anon_key: default_supabase_anon_key(),
            user_id: None,
            access_token: None,
            loop_clips: true,
            start_muted: true,
            show_accountability: false,
            preload_margin: default_preload_margin(),
        }
    }
}

impl FeedSettings {
    pub fn backend(&self) -> SupabaseConfig {
        let mut config = SupabaseConfig::new(&self.supabase_url, &self.supabase_anon_key);
        config.access_token = self
            .access_token
            .clone()
            .filter(|token| !token.trim().is_empty());
        config
    }

    pub fn signed_in_user(&self) -> Option<String> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    pub fn normalized(mut self) -> Self {
        if !self.preload_margin.is_finite() {
            self.preload_margin = default_preload_margin();
        }
        self.preload_margin = self.preload_margin.clamp(0.0, 4.0);
        self
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn save_settings(settings: FeedSettings) -> Result<(), DbError> {
    let conn = get_db_connection()?;

    let settings_json =
        serde_json::to_string(&settings).map_err(|e| DbError::new(e.to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES ('feed_settings', ?1)",
        [&settings_json],
    )
    .map_err(|e| DbError::new(e.to_string()))?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub async fn save_settings(settings: FeedSettings) -> Result<(), StorageError> {
    LocalStorage::set(SETTINGS_KEY, settings)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn load_settings() -> Result<FeedSettings, DbError> {
    let conn = get_db_connection()?;

    let result: Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM settings WHERE key = 'feed_settings'",
        [],
        |row: &rusqlite::Row| row.get(0),
    );

    match result {
        Ok(json) => serde_json::from_str::<FeedSettings>(&json)
            .map(FeedSettings::normalized)
            .map_err(|e| DbError::new(e.to_string())),
        Err(_) => Ok(FeedSettings::default()),
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn load_settings() -> Result<FeedSettings, StorageError> {
    match LocalStorage::get::<FeedSettings>(SETTINGS_KEY) {
        Ok(settings) => Ok(settings.normalized()),
        Err(_) => Ok(FeedSettings::default()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn initialize_database() -> Result<(), DbError> {
    let conn = get_db_connection()?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| DbError::new(e.to_string()))?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub async fn initialize_database() -> Result<(), StorageError> {
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn get_db_connection() -> Result<rusqlite::Connection, DbError> {
    let data_dir = data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let db_path = data_dir.join("civicclips.db");

    rusqlite::Connection::open(&db_path)
        .map_err(|e| DbError::new(format!("Failed to open database: {}", e)))
}

#[cfg(not(target_arch = "wasm32"))]
fn data_dir() -> Option<std::path::PathBuf> {
    let data_dir = dirs::data_dir()?.join("civicclips");
    std::fs::create_dir_all(&data_dir).ok()?;
    Some(data_dir)
}
