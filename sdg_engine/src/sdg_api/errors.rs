use thiserror::Error;

use crate::{
    db_types::{DonationId, DonationStatus},
    traits::{LedgerError, SettingsStoreError},
};

/// Problems with a donation request, found before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("The donation amount must be a positive whole number, but got {0}")]
    InvalidAmount(i64),
    #[error("A donor name is required")]
    MissingDonorName,
    #[error("The donor name may not be longer than {0} characters")]
    DonorNameTooLong(usize),
    #[error("The message may not be longer than {0} characters")]
    MessageTooLong(usize),
    #[error("Unsupported payment method: {0}")]
    UnsupportedProvider(String),
}

#[derive(Debug, Clone, Error)]
pub enum DonationFlowError {
    #[error("Invalid donation. {0}")]
    ValidationError(String),
    #[error("Unsupported payment method: {0}")]
    UnsupportedProvider(String),
    #[error("The callback could not be read. {0}")]
    MalformedCallback(String),
    #[error("The callback signature is invalid")]
    SignatureVerificationFailed,
    #[error("Donation {0} was not found")]
    RecordNotFound(DonationId),
    #[error("Donation {0} is no longer pending")]
    DonationNotPending(DonationId),
    #[error("Donation {id} is already {status} and cannot become {requested}")]
    TransitionForbidden { id: DonationId, status: DonationStatus, requested: DonationStatus },
    #[error("Persistence failure. {0}")]
    PersistenceFailure(String),
}

impl From<IntakeError> for DonationFlowError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::UnsupportedProvider(p) => Self::UnsupportedProvider(p),
            e => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<LedgerError> for DonationFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::PersistenceFailure(s),
            LedgerError::DonationNotFound(id) => Self::RecordNotFound(id),
            LedgerError::TransitionForbidden { id, status, requested } => {
                Self::TransitionForbidden { id, status, requested }
            },
            LedgerError::ReferenceLocked(id) => Self::DonationNotPending(id),
        }
    }
}

impl From<SettingsStoreError> for DonationFlowError {
    fn from(e: SettingsStoreError) -> Self {
        match e {
            SettingsStoreError::DatabaseError(s) => Self::PersistenceFailure(s),
        }
    }
}
