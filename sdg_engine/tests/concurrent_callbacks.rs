use futures_util::future::join_all;
use log::*;
use sdg_engine::{
    db_types::{DonationStatus, PaymentMethod},
    donation_objects::{CallbackOutcome, DonationIntent},
    helpers::trade_number_for,
    DonationLedger,
};
use tokio::sync::broadcast::error::TryRecvError;

use crate::support::{paid_callback, setup, signed_callback};

mod support;

fn intent(name: &str) -> DonationIntent {
    DonationIntent {
        amount: 500,
        donor_name: name.to_string(),
        message: None,
        payment_method: "ECPAY".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_callbacks_alert_once() {
    let system = setup().await;
    let mut alerts = system.bus.subscribe();
    let checkout = system.flow.submit_donation(intent("Alice")).await.unwrap();
    let id = checkout.donation_id;
    let trade_no = trade_number_for(&id);
    let body = signed_callback(PaymentMethod::EcPay, &paid_callback(&trade_no, "2401051304091234", Some(id.as_str())));

    let (a, b) = tokio::join!(
        system.callbacks.process_callback(PaymentMethod::EcPay, &body),
        system.callbacks.process_callback(PaymentMethod::EcPay, &body)
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let confirmed = outcomes.iter().filter(|o| matches!(o, CallbackOutcome::Confirmed(_))).count();
    let duplicates = outcomes.iter().filter(|o| matches!(o, CallbackOutcome::Duplicate(_))).count();
    assert_eq!(confirmed, 1);
    assert_eq!(duplicates, 1);

    assert_eq!(alerts.try_recv().unwrap().donor_name, "Alice");
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn callback_burst() {
    const DONATIONS: usize = 5;
    const RETRIES: usize = 4;
    let system = setup().await;
    let mut alerts = system.bus.subscribe();
    let mut bodies = Vec::with_capacity(DONATIONS * RETRIES);
    let mut ids = Vec::with_capacity(DONATIONS);
    for i in 0..DONATIONS {
        let checkout = system.flow.submit_donation(intent(&format!("Donor {i}"))).await.unwrap();
        let trade_no = trade_number_for(&checkout.donation_id);
        let trade_id = format!("24010513040900{i:02}");
        let body = signed_callback(
            PaymentMethod::EcPay,
            &paid_callback(&trade_no, &trade_id, Some(checkout.donation_id.as_str())),
        );
        for _ in 0..RETRIES {
            bodies.push(body.clone());
        }
        ids.push(checkout.donation_id);
    }
    info!("🚀️ Firing {} callbacks", bodies.len());
    let results = join_all(bodies.iter().map(|b| system.callbacks.process_callback(PaymentMethod::EcPay, b))).await;
    let outcomes = results.into_iter().collect::<Result<Vec<_>, _>>().expect("A callback failed");
    let confirmed = outcomes.iter().filter(|o| matches!(o, CallbackOutcome::Confirmed(_))).count();
    assert_eq!(confirmed, DONATIONS);
    assert_eq!(outcomes.len() - confirmed, DONATIONS * (RETRIES - 1));

    let mut alerted = Vec::new();
    while let Ok(event) = alerts.try_recv() {
        alerted.push(event.id);
    }
    alerted.sort();
    let mut expected = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
    expected.sort();
    assert_eq!(alerted, expected);

    for id in ids {
        let donation = system.db.fetch_donation_by_id(&id).await.unwrap().unwrap();
        assert_eq!(donation.status, DonationStatus::Success);
    }
}
