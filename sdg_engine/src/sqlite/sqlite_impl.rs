//! `SqliteDatabase` is the concrete storage backend of the donation engine.
//!
//! It implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, donations, new_pool, settings};
use crate::{
    db_types::{AlertSettings, Donation, DonationId, DonationStatus, NewDonation, Transition},
    traits::{DonationLedger, LedgerError, SettingsStore, SettingsStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl DonationLedger for SqliteDatabase {
    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::insert_donation(donation, &mut conn).await
    }

    async fn fetch_donation_by_id(&self, id: &DonationId) -> Result<Option<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let donation = donations::fetch_donation_by_id(id, &mut conn).await?;
        Ok(donation)
    }

    async fn fetch_donation_by_gateway_reference(&self, reference: &str) -> Result<Option<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let donation = donations::fetch_donation_by_gateway_reference(reference, &mut conn).await?;
        Ok(donation)
    }

    async fn assign_gateway_reference(&self, id: &DonationId, reference: &str) -> Result<Donation, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::assign_gateway_reference(id, reference, &mut conn).await
    }

    async fn mark_success(&self, id: &DonationId, transaction_id: &str) -> Result<Transition, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::transition_pending(id, DonationStatus::Success, Some(transaction_id), &mut conn).await
    }

    async fn mark_failed(&self, id: &DonationId) -> Result<Transition, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        donations::transition_pending(id, DonationStatus::Failed, None, &mut conn).await
    }

    async fn fetch_recent_donations(&self, limit: u32) -> Result<Vec<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = donations::fetch_recent_donations(limit, &mut conn).await?;
        Ok(result)
    }
}

impl SettingsStore for SqliteDatabase {
    async fn fetch_alert_settings(&self) -> Result<AlertSettings, SettingsStoreError> {
        let mut conn = self.pool.acquire().await?;
        let settings = settings::fetch_alert_settings(&mut conn).await?.unwrap_or_else(|| {
            warn!("🗃️ No alert settings have been stored. Using the defaults.");
            AlertSettings::default()
        });
        Ok(settings)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `SDG_DATABASE_URL`, or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Connects to the database at `url`, creating the file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
