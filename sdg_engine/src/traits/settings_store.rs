use thiserror::Error;

use crate::db_types::AlertSettings;

#[derive(Debug, Clone, Error)]
pub enum SettingsStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SettingsStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Read access to the streamer's alert settings. Editing the settings is someone else's job.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// Returns the stored settings, or the defaults if none have been saved yet.
    async fn fetch_alert_settings(&self) -> Result<AlertSettings, SettingsStoreError>;
}
