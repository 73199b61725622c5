use mockall::mock;
use sdg_engine::{
    db_types::{AlertSettings, Donation, DonationId, NewDonation, Transition},
    traits::{DonationLedger, LedgerError, SettingsStore, SettingsStoreError},
};

mock! {
    pub Backend {}
    impl DonationLedger for Backend {
        async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError>;
        async fn fetch_donation_by_id(&self, id: &DonationId) -> Result<Option<Donation>, LedgerError>;
        async fn fetch_donation_by_gateway_reference(&self, reference: &str) -> Result<Option<Donation>, LedgerError>;
        async fn assign_gateway_reference(&self, id: &DonationId, reference: &str) -> Result<Donation, LedgerError>;
        async fn mark_success(&self, id: &DonationId, transaction_id: &str) -> Result<Transition, LedgerError>;
        async fn mark_failed(&self, id: &DonationId) -> Result<Transition, LedgerError>;
        async fn fetch_recent_donations(&self, limit: u32) -> Result<Vec<Donation>, LedgerError>;
    }
    impl SettingsStore for Backend {
        async fn fetch_alert_settings(&self) -> Result<AlertSettings, SettingsStoreError>;
    }
}
