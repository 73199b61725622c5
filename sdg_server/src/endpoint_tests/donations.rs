use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use sdg_engine::{
    db_types::{AlertSettings, Donation, DonationStatus, PaymentMethod},
    events::NotificationBus,
    gateways::{Gateways, ECPAY_ACTION_URL},
    traits::LedgerError,
    DonationFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{donation, get_request, post_request, TRADE_NO},
    mocks::MockBackend,
};
use crate::routes::{CheckoutFormRoute, RecentDonationsRoute, SubmitDonationRoute};

const JSON: &str = "application/json";

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = DonationFlowApi::new(backend, Gateways::default(), NotificationBus::default());
        cfg.service(
            web::scope("/api")
                .service(SubmitDonationRoute::<MockBackend>::new())
                .service(RecentDonationsRoute::<MockBackend>::new()),
        )
        .service(CheckoutFormRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
    }
}

fn intake_backend(settings: AlertSettings) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_alert_settings().returning(move || Ok(settings.clone()));
    backend.expect_insert_donation().times(1).returning(|new| {
        Ok(Donation {
            id: new.id,
            amount: new.amount,
            donor_name: new.donor_name,
            message: new.message,
            payment_method: new.payment_method,
            status: DonationStatus::Pending,
            gateway_reference: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        })
    });
    backend.expect_assign_gateway_reference().times(1).returning(|id, reference| {
        let mut donation = donation(PaymentMethod::EcPay, DonationStatus::Pending);
        donation.id = id.clone();
        donation.gateway_reference = Some(reference.to_string());
        donation.updated_at = Utc::now();
        Ok(donation)
    });
    backend
}

fn body(value: Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

#[actix_web::test]
async fn submit_donation() {
    let _ = env_logger::try_init().ok();
    let backend = intake_backend(AlertSettings::default());
    let request = json!({"amount": 500, "donorName": "Alice", "message": "Love the stream", "paymentMethod": "ECPAY"});
    let (status, response) = post_request("/api/donations", JSON, body(request), configure(backend)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    let checkout: Value = serde_json::from_str(&response).unwrap();
    let id = checkout["donationId"].as_str().unwrap();
    assert_eq!(id.len(), 36);
    assert_eq!(checkout["actionUrl"], ECPAY_ACTION_URL);
    let params = &checkout["paymentParams"];
    assert_eq!(params["MerchantTradeNo"].as_str().unwrap(), &id.replace('-', "")[..20]);
    assert_eq!(params["TotalAmount"], "500");
    assert_eq!(params["CustomField1"].as_str(), Some(id));
    assert_eq!(params["ReturnURL"], "http://127.0.0.1:8360/api/payment/ecpay/callback");
    assert_eq!(params["CheckMacValue"].as_str().unwrap().len(), 64);
}

#[actix_web::test]
async fn invalid_donations_are_refused() {
    let _ = env_logger::try_init().ok();
    let cases = [
        (json!({"amount": 0, "donorName": "Alice", "paymentMethod": "ECPAY"}), "positive whole number"),
        (json!({"amount": 100, "donorName": "  ", "paymentMethod": "ECPAY"}), "donor name is required"),
        (json!({"amount": 100, "donorName": "Alice", "paymentMethod": "PAYPAL"}), "Unsupported payment method"),
        (json!({"amount": "lots", "donorName": "Alice", "paymentMethod": "ECPAY"}), "invalid type"),
        (json!({"donorName": "Alice"}), "missing field"),
    ];
    for (request, expected) in cases {
        let (status, response) =
            post_request("/api/donations", JSON, body(request.clone()), configure(MockBackend::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{request}");
        let error: Value = serde_json::from_str(&response).unwrap();
        assert!(error["error"].as_str().unwrap().contains(expected), "{request} gave {response}");
    }
}

#[actix_web::test]
async fn disabled_provider_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_alert_settings().returning(|| Ok(AlertSettings { enable_opay: false, ..Default::default() }));
    let request = json!({"amount": 100, "donorName": "Bob", "paymentMethod": "OPAY"});
    let (status, response) = post_request("/api/donations", JSON, body(request), configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, r#"{"error":"Unsupported payment method: OPAY"}"#);
}

#[actix_web::test]
async fn persistence_failures_are_generic() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_alert_settings().returning(|| Ok(AlertSettings::default()));
    backend
        .expect_insert_donation()
        .returning(|_| Err(LedgerError::DatabaseError("unable to open database file: /srv/data".into())));
    let request = json!({"amount": 100, "donorName": "Bob", "paymentMethod": "ECPAY"});
    let (status, response) = post_request("/api/donations", JSON, body(request), configure(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.contains("/srv/data"));
}

#[actix_web::test]
async fn recent_donations() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_recent_donations()
        .withf(|limit| *limit == 20)
        .times(1)
        .returning(|_| Ok(vec![donation(PaymentMethod::EcPay, DonationStatus::Success)]));
    let (status, response) = get_request("/api/donations", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let donations: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(donations[0]["donorName"], "Alice");
    assert_eq!(donations[0]["status"], "SUCCESS");
    assert_eq!(donations[0]["paymentMethod"], "ECPAY");
    assert_eq!(donations[0]["amount"], 500);
}

#[actix_web::test]
async fn recent_donations_limit_is_capped() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_recent_donations().withf(|limit| *limit == 100).times(1).returning(|_| Ok(vec![]));
    let (status, response) = get_request("/api/donations?limit=5000", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, "[]");
}

#[actix_web::test]
async fn checkout_form_for_pending_donation() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_donation_by_id()
        .returning(|_| Ok(Some(donation(PaymentMethod::EcPay, DonationStatus::Pending))));
    let (status, response) =
        get_request("/checkout/a1b2c3d4-e5f6-7890-abcd-ef1234567890", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(&format!(r#"action="{ECPAY_ACTION_URL}""#)), "{response}");
    assert!(response.contains(TRADE_NO));
}

#[actix_web::test]
async fn checkout_form_for_paid_or_missing_donation() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_donation_by_id()
        .returning(|_| Ok(Some(donation(PaymentMethod::EcPay, DonationStatus::Success))));
    let (status, _) = get_request("/checkout/a1b2c3d4-e5f6-7890-abcd-ef1234567890", configure(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut backend = MockBackend::new();
    backend.expect_fetch_donation_by_id().returning(|_| Ok(None));
    let (status, _) = get_request("/checkout/nope", configure(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
