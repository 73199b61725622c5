//! # Storage contracts
//!
//! This module defines the behaviour that a storage backend must provide in order to be used by the donation engine.
//! The public APIs in [`crate::sdg_api`] are generic over these traits, so that the HTTP layer can be tested against
//! mocks and the backend can be swapped without touching the payment logic.
//!
//! * [`DonationLedger`] records donations and owns their `PENDING` → `SUCCESS | FAILED` lifecycle.
//! * [`SettingsStore`] provides read-only access to the streamer's alert settings.
mod donation_ledger;
mod settings_store;

pub use donation_ledger::{DonationLedger, LedgerError};
pub use settings_store::{SettingsStore, SettingsStoreError};
