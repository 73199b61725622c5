use std::fmt::Display;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Donation, DonationAmount, DonationId, NewDonation, PaymentMethod},
    gateways::FormFields,
    sdg_api::errors::IntakeError,
};

pub const MAX_DONOR_NAME_LENGTH: usize = 50;
pub const MAX_MESSAGE_LENGTH: usize = 200;

/// A donation request, as submitted by the donation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationIntent {
    pub amount: i64,
    pub donor_name: String,
    #[serde(default)]
    pub message: Option<String>,
    pub payment_method: String,
}

impl DonationIntent {
    /// Validates the request and turns it into a new ledger record with a fresh id.
    ///
    /// Names and messages are trimmed. An empty message is treated as no message at all.
    pub fn try_into_new_donation(self) -> Result<NewDonation, IntakeError> {
        let amount = DonationAmount::try_from(self.amount).map_err(|e| IntakeError::InvalidAmount(e.0))?;
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| IntakeError::UnsupportedProvider(self.payment_method.clone()))?;
        let donor_name = self.donor_name.trim().to_string();
        if donor_name.is_empty() {
            return Err(IntakeError::MissingDonorName);
        }
        if donor_name.chars().count() > MAX_DONOR_NAME_LENGTH {
            return Err(IntakeError::DonorNameTooLong(MAX_DONOR_NAME_LENGTH));
        }
        let message = self.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
        if message.as_ref().is_some_and(|m| m.chars().count() > MAX_MESSAGE_LENGTH) {
            return Err(IntakeError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }
        Ok(NewDonation {
            id: DonationId::random(),
            amount,
            donor_name,
            message,
            payment_method,
            created_at: Utc::now(),
        })
    }
}

/// The response to a donation request: everything the donation page needs to send the donor to the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationCheckout {
    pub donation_id: DonationId,
    pub action_url: String,
    pub payment_params: FormFields,
}

/// What happened to a callback that passed signature verification. The gateway is acknowledged in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The donation is now `SUCCESS` and its alert has been published.
    Confirmed(Donation),
    /// The donation was already `SUCCESS`. Nothing was written or published.
    Duplicate(Donation),
    /// The gateway reported that the payment did not complete. The donation is untouched.
    NotPaid { donation: Donation, rtn_code: String },
    /// The donation is `FAILED`, so the success report was ignored.
    Conflict(Donation),
    /// No donation matches this callback.
    Unresolved,
}

impl Display for CallbackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed(d) => write!(f, "Donation {} confirmed", d.id),
            Self::Duplicate(d) => write!(f, "Donation {} was already confirmed", d.id),
            Self::NotPaid { donation, rtn_code } => write!(f, "Donation {} not paid (RtnCode {rtn_code})", donation.id),
            Self::Conflict(d) => write!(f, "Donation {} is {} and was left alone", d.id, d.status),
            Self::Unresolved => write!(f, "No matching donation"),
        }
    }
}
