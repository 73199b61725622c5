//! # Payment gateway adapters
//!
//! Each supported gateway implements [`PaymentGateway`]. The trait carries the shared ECPay-style "AIO" checkout
//! protocol in its provided methods; an adapter only supplies its configuration and the whitelist of form fields the
//! gateway accepts. O'Pay, for example, rejects `CustomField1` with a "Parameter Error", so its whitelist omits it.
//!
//! [`Gateways`] holds one adapter per [`PaymentMethod`] and is the only place a method is mapped to an adapter.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Donation, PaymentMethod},
    helpers::{generate_check_mac_value, trade_number_for, verify_check_mac_value, CHECK_MAC_FIELD},
};

mod config;
mod ecpay;
mod opay;
mod payment_request;

pub use config::{
    GatewayConfig,
    DEFAULT_CALLBACK_BASE_URL,
    DEFAULT_TRADE_TZ_OFFSET_HOURS,
    ECPAY_ACTION_URL,
    OPAY_ACTION_URL,
};
pub use ecpay::EcPayGateway;
pub use opay::OPayGateway;
pub use payment_request::{FormFields, PaymentRequest};

pub const TRADE_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
pub const TRADE_DESCRIPTION: &str = "Streamer Donation";
/// The free-form field ECPay echoes back in its callback. Used to carry the donation id.
pub const DONATION_ID_FIELD: &str = "CustomField1";

pub trait PaymentGateway: Send + Sync {
    fn method(&self) -> PaymentMethod;

    fn config(&self) -> &GatewayConfig;

    /// The form fields this gateway accepts, in the order they are sent. `CheckMacValue` is always appended last.
    fn accepted_fields(&self) -> &'static [&'static str];

    /// True if the gateway echoes the donation id back to us in its payment callback.
    fn echoes_donation_id(&self) -> bool {
        self.accepted_fields().contains(&DONATION_ID_FIELD)
    }

    fn callback_url(&self) -> String {
        let base = self.config().callback_base_url.trim_end_matches('/');
        format!("{base}/api/payment/{}/callback", self.method().slug())
    }

    /// Builds the signed checkout form for `donation`. `now` becomes the `MerchantTradeDate`.
    fn build_payment_request(&self, donation: &Donation, now: DateTime<Utc>) -> PaymentRequest {
        let config = self.config();
        let mut form_fields = FormFields::default();
        for &field in self.accepted_fields() {
            let value = match field {
                "MerchantID" => config.merchant_id.clone(),
                "MerchantTradeNo" => trade_number_for(&donation.id),
                "MerchantTradeDate" => {
                    now.with_timezone(&config.trade_timezone()).format(TRADE_DATE_FORMAT).to_string()
                },
                "PaymentType" => "aio".to_string(),
                "TotalAmount" => donation.amount.to_string(),
                "TradeDesc" => TRADE_DESCRIPTION.to_string(),
                "ItemName" => format!("Donation from {}", donation.donor_name),
                "ReturnURL" => self.callback_url(),
                "ChoosePayment" => "ALL".to_string(),
                "EncryptType" => "1".to_string(),
                DONATION_ID_FIELD => donation.id.to_string(),
                other => {
                    error!("🧾️ {} lists {other} as an accepted field, but no value is defined for it", self.method());
                    continue;
                },
            };
            form_fields.push(field, value);
        }
        let mac = generate_check_mac_value(form_fields.iter(), config.hash_key.reveal(), config.hash_iv.reveal());
        form_fields.push(CHECK_MAC_FIELD, mac);
        trace!("🧾️ Built {} payment request for donation {}", self.method(), donation.id);
        PaymentRequest { action_url: config.action_url.clone(), form_fields }
    }

    /// Checks the `CheckMacValue` of an inbound callback with this gateway's secrets.
    fn verify_callback(&self, params: &HashMap<String, String>) -> bool {
        let config = self.config();
        verify_check_mac_value(params, config.hash_key.reveal(), config.hash_iv.reveal())
    }
}

/// One adapter per supported gateway.
#[derive(Clone, Debug)]
pub struct Gateways {
    ecpay: EcPayGateway,
    opay: OPayGateway,
}

impl Gateways {
    pub fn new(ecpay: GatewayConfig, opay: GatewayConfig) -> Self {
        Self { ecpay: EcPayGateway::new(ecpay), opay: OPayGateway::new(opay) }
    }

    pub fn gateway(&self, method: PaymentMethod) -> &dyn PaymentGateway {
        match method {
            PaymentMethod::EcPay => &self.ecpay,
            PaymentMethod::OPay => &self.opay,
        }
    }
}

impl Default for Gateways {
    fn default() -> Self {
        Self::new(GatewayConfig::staging(PaymentMethod::EcPay), GatewayConfig::staging(PaymentMethod::OPay))
    }
}
