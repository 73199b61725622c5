use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use sdg_engine::{
    db_types::{Donation, DonationAmount, DonationId, DonationStatus, PaymentMethod},
    gateways::GatewayConfig,
    helpers::{generate_check_mac_value, CHECK_MAC_FIELD},
};

use crate::server::json_config;

pub const DONATION_ID: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";
pub const TRADE_NO: &str = "a1b2c3d4e5f67890abcd";

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<F>(path: &str, content_type: &str, body: Vec<u8>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post().uri(path).insert_header(("Content-Type", content_type)).set_payload(body);
    send(req, configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub fn donation(method: PaymentMethod, status: DonationStatus) -> Donation {
    Donation {
        id: DonationId::from(DONATION_ID),
        amount: DonationAmount::try_from(500).unwrap(),
        donor_name: "Alice".to_string(),
        message: Some("Love the stream".to_string()),
        payment_method: method,
        status,
        gateway_reference: Some(TRADE_NO.to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 5, 5, 4, 9).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 5, 5, 4, 9).unwrap(),
    }
}

/// A form-encoded callback body, signed with the gateway's staging secrets.
pub fn signed_callback(method: PaymentMethod, params: &[(&str, &str)]) -> Vec<u8> {
    let config = GatewayConfig::staging(method);
    let mac = generate_check_mac_value(params.iter().copied(), config.hash_key.reveal(), config.hash_iv.reveal());
    let mut body = url::form_urlencoded::Serializer::new(String::new());
    body.extend_pairs(params.iter().copied());
    body.append_pair(CHECK_MAC_FIELD, &mac);
    body.finish().into_bytes()
}

pub fn paid_callback(with_donation_id: bool) -> Vec<(&'static str, &'static str)> {
    let mut params = vec![
        ("MerchantID", "3002599"),
        ("MerchantTradeNo", TRADE_NO),
        ("RtnCode", "1"),
        ("RtnMsg", "Succeeded"),
        ("TradeNo", "2401051304091234"),
        ("TradeAmt", "500"),
        ("PaymentDate", "2024/01/05 13:05:10"),
        ("PaymentType", "Credit_CreditCard"),
        ("TradeDate", "2024/01/05 13:04:09"),
        ("SimulatePaid", "0"),
    ];
    if with_donation_id {
        params.push(("CustomField1", DONATION_ID));
    }
    params
}
