use crate::{
    db_types::PaymentMethod,
    gateways::{GatewayConfig, PaymentGateway},
};

// O'Pay answers "Parameter Error" if CustomField1 is present
const OPAY_FIELDS: [&str; 10] = [
    "MerchantID",
    "MerchantTradeNo",
    "MerchantTradeDate",
    "PaymentType",
    "TotalAmount",
    "TradeDesc",
    "ItemName",
    "ReturnURL",
    "ChoosePayment",
    "EncryptType",
];

/// O'Pay (歐付寶) all-in-one checkout.
#[derive(Clone, Debug)]
pub struct OPayGateway {
    config: GatewayConfig,
}

impl OPayGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

impl PaymentGateway for OPayGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::OPay
    }

    fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn accepted_fields(&self) -> &'static [&'static str] {
        &OPAY_FIELDS
    }
}
