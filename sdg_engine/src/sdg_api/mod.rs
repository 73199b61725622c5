//! # Donation engine public API
//!
//! * [`donation_flow_api`] takes donation requests, prepares signed gateway checkouts, and lists donations.
//! * [`callback_api`] ingests gateway payment callbacks and publishes alerts for confirmed donations.
//!
//! Both APIs are created by supplying a storage backend that implements the traits in [`crate::traits`], the gateway
//! adapters, and the notification bus that alerts go out on.
//!
//! ```rust,ignore
//! use sdg_engine::{events::NotificationBus, gateways::Gateways, CallbackApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let bus = NotificationBus::default();
//! let api = CallbackApi::new(db, Gateways::default(), bus.clone());
//! let outcome = api.process_callback(PaymentMethod::EcPay, body).await?;
//! ```
pub mod callback_api;
pub mod donation_flow_api;
pub mod donation_objects;
pub mod errors;
