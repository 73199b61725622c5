use crate::{
    db_types::PaymentMethod,
    gateways::{GatewayConfig, PaymentGateway},
};

const ECPAY_FIELDS: [&str; 11] = [
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
    "CustomField1",
];

/// ECPay (綠界科技) all-in-one checkout.
#[derive(Clone, Debug)]
pub struct EcPayGateway {
    config: GatewayConfig,
}

impl EcPayGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

impl PaymentGateway for EcPayGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::EcPay
    }

    fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn accepted_fields(&self) -> &'static [&'static str] {
        &ECPAY_FIELDS
    }
}
