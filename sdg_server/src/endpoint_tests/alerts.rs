use actix_web::{http::StatusCode, web, web::ServiceConfig};
use sdg_engine::{
    db_types::AlertSettings,
    events::NotificationBus,
    gateways::Gateways,
    traits::SettingsStoreError,
    DonationFlowApi,
};
use serde_json::Value;

use super::{
    helpers::{get_request, post_request},
    mocks::MockBackend,
};
use crate::routes::{AlertSettingsRoute, TestAlertRoute};

fn configure(backend: MockBackend, bus: NotificationBus) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = DonationFlowApi::new(backend, Gateways::default(), bus);
        cfg.service(
            web::scope("/api")
                .service(AlertSettingsRoute::<MockBackend>::new())
                .service(TestAlertRoute::<MockBackend>::new()),
        )
        .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn fetch_settings() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_alert_settings().times(1).returning(|| {
        Ok(AlertSettings { sound_url: Some("https://cdn.example.com/coin.mp3".into()), ..Default::default() })
    });
    let (status, response) = get_request("/api/settings", configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::OK);
    let settings: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(settings["messageTemplate"], "{name} 贊助了 ${amount}");
    assert_eq!(settings["durationMs"], 5000);
    assert_eq!(settings["animationDurationMs"], 1000);
    assert_eq!(settings["soundUrl"], "https://cdn.example.com/coin.mp3");
    assert_eq!(settings["imageUrl"], Value::Null);
    assert_eq!(settings["enableEcpay"], true);
}

#[actix_web::test]
async fn settings_store_failure() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_alert_settings().returning(|| Err(SettingsStoreError::DatabaseError("gone".into())));
    let (status, _) = get_request("/api/settings", configure(backend, NotificationBus::default())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_alert_reaches_subscribers() {
    let _ = env_logger::try_init().ok();
    let bus = NotificationBus::default();
    let mut overlay = bus.subscribe();
    // Test alerts never touch the ledger
    let (status, response) =
        post_request("/api/alerts/test", "application/json", vec![], configure(MockBackend::new(), bus)).await;
    assert_eq!(status, StatusCode::OK);
    let event: Value = serde_json::from_str(&response).unwrap();
    let received = overlay.try_recv().expect("Test alert was not published");
    assert_eq!(event["id"], received.id.as_str());
    assert!(received.id.starts_with("test-"));
    assert_eq!(received.amount.value(), 666);
    assert_eq!(event["donorName"], "測試人員");
}
