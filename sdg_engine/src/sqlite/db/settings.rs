use sqlx::SqliteConnection;

use crate::db_types::AlertSettings;

pub async fn fetch_alert_settings(conn: &mut SqliteConnection) -> Result<Option<AlertSettings>, sqlx::Error> {
    let settings = sqlx::query_as("SELECT * FROM alert_settings WHERE id = 1").fetch_optional(conn).await?;
    Ok(settings)
}
