use thiserror::Error;

use crate::db_types::{Donation, DonationId, DonationStatus, NewDonation, Transition};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Donation {0} does not exist")]
    DonationNotFound(DonationId),
    #[error("Donation {id} is already {status} and cannot become {requested}")]
    TransitionForbidden { id: DonationId, status: DonationStatus, requested: DonationStatus },
    #[error("The gateway reference for donation {0} can only be changed while it is pending")]
    ReferenceLocked(DonationId),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// The donation record store, and the only place donation status changes.
///
/// Status changes are compare-and-set operations against `PENDING`. Calling [`DonationLedger::mark_success`] twice for
/// the same donation yields [`Transition::Applied`] once and [`Transition::Unchanged`] thereafter, no matter how the
/// calls interleave.
#[allow(async_fn_in_trait)]
pub trait DonationLedger {
    /// Stores a new donation with status `PENDING`.
    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError>;

    async fn fetch_donation_by_id(&self, id: &DonationId) -> Result<Option<Donation>, LedgerError>;

    /// Looks a donation up by its trade number, or by the gateway's transaction id once it has been paid.
    async fn fetch_donation_by_gateway_reference(&self, reference: &str) -> Result<Option<Donation>, LedgerError>;

    /// Sets the gateway reference (the trade number) on a pending donation.
    ///
    /// Fails with [`LedgerError::ReferenceLocked`] if the donation is no longer pending.
    async fn assign_gateway_reference(&self, id: &DonationId, reference: &str) -> Result<Donation, LedgerError>;

    /// Moves a pending donation to `SUCCESS`, storing the gateway's permanent transaction id as its reference.
    ///
    /// * A donation that is already `SUCCESS` is returned as [`Transition::Unchanged`].
    /// * A `FAILED` donation results in [`LedgerError::TransitionForbidden`].
    async fn mark_success(&self, id: &DonationId, transaction_id: &str) -> Result<Transition, LedgerError>;

    /// Moves a pending donation to `FAILED`. Same contract as [`DonationLedger::mark_success`], mirrored.
    async fn mark_failed(&self, id: &DonationId) -> Result<Transition, LedgerError>;

    /// The most recent donations, newest first.
    async fn fetch_recent_donations(&self, limit: u32) -> Result<Vec<Donation>, LedgerError>;
}
