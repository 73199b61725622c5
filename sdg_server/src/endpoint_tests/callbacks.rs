use actix_web::{http::StatusCode, web, web::ServiceConfig};
use sdg_engine::{
    db_types::{DonationStatus, PaymentMethod, Transition},
    events::NotificationBus,
    gateways::Gateways,
    traits::LedgerError,
    CallbackApi,
};
use tokio::sync::broadcast::error::TryRecvError;

use super::{
    helpers::{donation, paid_callback, post_request, signed_callback, DONATION_ID, TRADE_NO},
    mocks::MockBackend,
};
use crate::{
    config::{ServerConfig, ServerOptions},
    payment_routes::{EcpayCallbackRoute, OpayCallbackRoute},
};

const FORM: &str = "application/x-www-form-urlencoded";
const ECPAY_CALLBACK: &str = "/api/payment/ecpay/callback";
const OPAY_CALLBACK: &str = "/api/payment/opay/callback";

fn configure(backend: MockBackend, bus: NotificationBus) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = CallbackApi::new(backend, Gateways::default(), bus);
        let options = ServerOptions::from_config(&ServerConfig::default());
        cfg.service(
            web::scope("/api")
                .service(EcpayCallbackRoute::<MockBackend>::new())
                .service(OpayCallbackRoute::<MockBackend>::new()),
        )
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(options));
    }
}

fn pending_ecpay_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_donation_by_id()
        .withf(|id| id.as_str() == DONATION_ID)
        .returning(|_| Ok(Some(donation(PaymentMethod::EcPay, DonationStatus::Pending))));
    backend
}

#[actix_web::test]
async fn paid_callback_is_acknowledged_and_alerted() {
    let _ = env_logger::try_init().ok();
    let mut backend = pending_ecpay_backend();
    backend
        .expect_mark_success()
        .withf(|id, tx| id.as_str() == DONATION_ID && &tx[..] == "2401051304091234")
        .times(1)
        .returning(|_, _| Ok(Transition::Applied(donation(PaymentMethod::EcPay, DonationStatus::Success))));
    let bus = NotificationBus::default();
    let mut alerts = bus.subscribe();
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(true));
    let (status, body) = post_request(ECPAY_CALLBACK, FORM, body, configure(backend, bus)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
    let alert = alerts.try_recv().expect("No alert was published");
    assert_eq!(alert.donor_name, "Alice");
    assert_eq!(alert.amount.value(), 500);
    assert_eq!(alert.message.as_deref(), Some("Love the stream"));
}

#[actix_web::test]
async fn repeated_callback_is_acknowledged_quietly() {
    let _ = env_logger::try_init().ok();
    let mut backend = pending_ecpay_backend();
    backend
        .expect_mark_success()
        .returning(|_, _| Ok(Transition::Unchanged(donation(PaymentMethod::EcPay, DonationStatus::Success))));
    let bus = NotificationBus::default();
    let mut alerts = bus.subscribe();
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(true));
    // Keep a sender alive, so that an empty channel reads as `Empty` rather than `Closed`
    let (status, body) = post_request(ECPAY_CALLBACK, FORM, body, configure(backend, bus.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));
    drop(bus);
}

#[actix_web::test]
async fn forged_callback_is_rejected() {
    let _ = env_logger::try_init().ok();
    // No expectations: touching the ledger at all fails the test
    let backend = MockBackend::new();
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(true));
    let forged = String::from_utf8(body).unwrap().replace("TradeAmt=500", "TradeAmt=50000").into_bytes();
    let (status, body) =
        post_request(ECPAY_CALLBACK, FORM, forged, configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "0|ErrorMessage");
}

#[actix_web::test]
async fn callback_for_the_wrong_gateway_is_rejected() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(true));
    let (status, body) = post_request(OPAY_CALLBACK, FORM, body, configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "0|ErrorMessage");
}

#[actix_web::test]
async fn empty_callback_is_rejected() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let (status, body) =
        post_request(ECPAY_CALLBACK, FORM, vec![], configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "0|ErrorMessage");
}

#[actix_web::test]
async fn unknown_donation_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_donation_by_id().returning(|_| Ok(None));
    backend.expect_fetch_donation_by_gateway_reference().times(2).returning(|_| Ok(None));
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(true));
    let (status, body) = post_request(ECPAY_CALLBACK, FORM, body, configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
}

#[actix_web::test]
async fn unpaid_callback_changes_nothing() {
    let _ = env_logger::try_init().ok();
    let backend = pending_ecpay_backend();
    let mut params = paid_callback(true);
    params[2] = ("RtnCode", "10100058");
    let body = signed_callback(PaymentMethod::EcPay, &params);
    let (status, body) = post_request(ECPAY_CALLBACK, FORM, body, configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
}

#[actix_web::test]
async fn database_failure_asks_for_a_retry() {
    let _ = env_logger::try_init().ok();
    let mut backend = pending_ecpay_backend();
    backend.expect_mark_success().returning(|_, _| Err(LedgerError::DatabaseError("database is locked".into())));
    let bus = NotificationBus::default();
    let mut alerts = bus.subscribe();
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(true));
    let (status, body) = post_request(ECPAY_CALLBACK, FORM, body, configure(backend, bus.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "0|ErrorMessage");
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));
    drop(bus);
}

#[actix_web::test]
async fn opay_callback_resolves_by_trade_number() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_donation_by_gateway_reference()
        .withf(|reference| &reference[..] == TRADE_NO)
        .times(1)
        .returning(|_| Ok(Some(donation(PaymentMethod::OPay, DonationStatus::Pending))));
    backend
        .expect_mark_success()
        .times(1)
        .returning(|_, _| Ok(Transition::Applied(donation(PaymentMethod::OPay, DonationStatus::Success))));
    let bus = NotificationBus::default();
    let mut alerts = bus.subscribe();
    let body = signed_callback(PaymentMethod::OPay, &paid_callback(false));
    let (status, body) = post_request(OPAY_CALLBACK, FORM, body, configure(backend, bus)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
    assert_eq!(alerts.try_recv().unwrap().id, DONATION_ID);
}
