//! Stream Donation Gateway engine
//!
//! The engine holds the payment pipeline behind a streamer's donation page:
//!
//! 1. Signing ([`mod@helpers`]). ECPay and O'Pay authenticate their forms with a SHA-256 `CheckMacValue`. The same
//!    code signs outbound checkout requests and verifies inbound payment callbacks.
//! 2. Gateway adapters ([`mod@gateways`]). One adapter per gateway shapes the checkout form: merchant id, trade
//!    number, callback URL, and the fields that gateway accepts.
//! 3. The donation ledger ([`mod@traits`], [`mod@sqlite`]). Donations start out `PENDING` and move to `SUCCESS` or
//!    `FAILED` exactly once, through compare-and-set updates.
//! 4. The public API ([`mod@sdg_api`]). Donation intake and callback ingestion.
//! 5. Alert fan-out ([`mod@events`]). Confirmed donations are broadcast to every connected overlay.
pub mod db_types;
pub mod events;
pub mod gateways;
pub mod helpers;
pub mod sdg_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sdg_api::{
    callback_api::CallbackApi,
    donation_flow_api::DonationFlowApi,
    donation_objects,
    errors::{DonationFlowError, IntakeError},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{DonationLedger, LedgerError, SettingsStore, SettingsStoreError};
