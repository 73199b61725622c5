use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use sdg_common::DonationAmount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------      DonationId     ---------------------------------------------------------
/// The opaque identifier of a donation. New ids are random UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct DonationId(pub String);

impl DonationId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DonationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DonationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for DonationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    DonationStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DonationStatus {
    /// The donation has been recorded, and the donor has been sent to the payment gateway.
    Pending,
    /// The gateway has confirmed payment. This is a terminal state.
    Success,
    /// The payment did not go through. This is a terminal state.
    Failed,
}

impl DonationStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            DonationStatus::Pending => false,
            DonationStatus::Success | DonationStatus::Failed => true,
        }
    }
}

impl Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Pending => write!(f, "PENDING"),
            DonationStatus::Success => write!(f, "SUCCESS"),
            DonationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for DonationStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid donation status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
/// The payment gateways a donation can be paid through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// ECPay (綠界科技)
    EcPay,
    /// O'Pay (歐付寶)
    OPay,
}

impl PaymentMethod {
    /// The lower-case name used in callback paths, e.g. `/api/payment/ecpay/callback`.
    pub fn slug(&self) -> &'static str {
        match self {
            PaymentMethod::EcPay => "ecpay",
            PaymentMethod::OPay => "opay",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::EcPay => write!(f, "ECPAY"),
            PaymentMethod::OPay => write!(f, "OPAY"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECPAY" => Ok(Self::EcPay),
            "OPAY" => Ok(Self::OPay),
            s => Err(ConversionError(format!("Unsupported payment method: {s}"))),
        }
    }
}

//--------------------------------------       Donation      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: DonationId,
    pub amount: DonationAmount,
    pub donor_name: String,
    pub message: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: DonationStatus,
    /// The trade number sent to the gateway, replaced by the gateway's own transaction id once paid.
    pub gateway_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewDonation     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub id: DonationId,
    pub amount: DonationAmount,
    pub donor_name: String,
    pub message: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl NewDonation {
    pub fn new(amount: DonationAmount, donor_name: &str, payment_method: PaymentMethod) -> Self {
        Self {
            id: DonationId::random(),
            amount,
            donor_name: donor_name.to_string(),
            message: None,
            payment_method,
            created_at: Utc::now(),
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_id(mut self, id: DonationId) -> Self {
        self.id = id;
        self
    }
}

//--------------------------------------      Transition     ---------------------------------------------------------
/// The result of a compare-and-set status change on a donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The donation moved out of `PENDING` as a result of this call.
    Applied(Donation),
    /// The donation was already in the requested state. Nothing was written.
    Unchanged(Donation),
}

impl Transition {
    pub fn donation(&self) -> &Donation {
        match self {
            Transition::Applied(d) | Transition::Unchanged(d) => d,
        }
    }

    pub fn into_donation(self) -> Donation {
        match self {
            Transition::Applied(d) | Transition::Unchanged(d) => d,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

//--------------------------------------    AlertSettings    ---------------------------------------------------------
/// Streamer-controlled settings for the on-screen alert. The core only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    /// Headline template. `{name}` is replaced by the donor name and `{amount}` by the amount.
    pub message_template: String,
    /// How long an alert stays on screen, in milliseconds.
    pub duration_ms: i64,
    /// Length of the exit animation, in milliseconds.
    pub animation_duration_ms: i64,
    pub sound_url: Option<String>,
    pub image_url: Option<String>,
    pub enable_ecpay: bool,
    pub enable_opay: bool,
}

pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{name} 贊助了 ${amount}";
pub const DEFAULT_ALERT_DURATION_MS: i64 = 5_000;
pub const DEFAULT_ANIMATION_DURATION_MS: i64 = 1_000;

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            duration_ms: DEFAULT_ALERT_DURATION_MS,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            sound_url: None,
            image_url: None,
            enable_ecpay: true,
            enable_opay: true,
        }
    }
}

impl AlertSettings {
    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::EcPay => self.enable_ecpay,
            PaymentMethod::OPay => self.enable_opay,
        }
    }
}
