use chrono::{FixedOffset, Offset, Utc};
use log::*;
use sdg_common::Secret;

use crate::db_types::PaymentMethod;

pub const ECPAY_ACTION_URL: &str = "https://payment.ecpay.com.tw/Cashier/AioCheckOut/V5";
pub const OPAY_ACTION_URL: &str = "https://payment.opay.tw/Cashier/AioCheckOut/V5";
/// Trade dates are sent in Taiwan local time unless configured otherwise.
pub const DEFAULT_TRADE_TZ_OFFSET_HOURS: i32 = 8;
pub const DEFAULT_CALLBACK_BASE_URL: &str = "http://127.0.0.1:8360";

/// Merchant credentials and endpoints for a single gateway.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub merchant_id: String,
    pub hash_key: Secret<String>,
    pub hash_iv: Secret<String>,
    /// Where the donor's browser posts the signed form.
    pub action_url: String,
    /// The public base URL of this server. The gateway posts payment results to `<base>/api/payment/<gw>/callback`.
    pub callback_base_url: String,
    pub trade_tz_offset_hours: i32,
}

impl GatewayConfig {
    /// The public staging credentials published by each gateway. Fine for development, useless for real money.
    pub fn staging(method: PaymentMethod) -> Self {
        let (merchant_id, hash_key, hash_iv, action_url) = match method {
            PaymentMethod::EcPay => ("3002599", "spPjZn66i0OhqJsQ", "hT5OJckN45isQTTs", ECPAY_ACTION_URL),
            PaymentMethod::OPay => ("2000132", "5294y06JbISpM5x9", "v77hoKGq4kWxNNIS", OPAY_ACTION_URL),
        };
        Self {
            merchant_id: merchant_id.to_string(),
            hash_key: Secret::new(hash_key.to_string()),
            hash_iv: Secret::new(hash_iv.to_string()),
            action_url: action_url.to_string(),
            callback_base_url: DEFAULT_CALLBACK_BASE_URL.to_string(),
            trade_tz_offset_hours: DEFAULT_TRADE_TZ_OFFSET_HOURS,
        }
    }

    pub fn with_callback_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.callback_base_url = base_url.into();
        self
    }

    pub fn with_credentials(mut self, merchant_id: &str, hash_key: &str, hash_iv: &str) -> Self {
        self.merchant_id = merchant_id.to_string();
        self.hash_key = Secret::new(hash_key.to_string());
        self.hash_iv = Secret::new(hash_iv.to_string());
        self
    }

    /// The timezone that `MerchantTradeDate` is expressed in. Out-of-range offsets fall back to UTC.
    pub fn trade_timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.trade_tz_offset_hours.saturating_mul(3600)).unwrap_or_else(|| {
            warn!("🧾️ {} is not a valid UTC offset in hours. Trade dates will be in UTC.", self.trade_tz_offset_hours);
            Utc.fix()
        })
    }
}
