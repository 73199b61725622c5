use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db_types::{Donation, DonationAmount};

/// The name of the server-sent event that carries an [`AlertEvent`].
pub const NEW_DONATION_EVENT: &str = "new-donation";

/// What an overlay needs to know in order to show a donation on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub id: String,
    pub donor_name: String,
    pub amount: DonationAmount,
    pub message: Option<String>,
}

impl AlertEvent {
    /// A synthetic alert that lets the streamer check their overlay without paying themselves.
    ///
    /// Ids are `test-<millis>-<random>`, so test alerts sent in the same millisecond are still told apart.
    pub fn test_event() -> Self {
        Self {
            id: format!("test-{}-{}", Utc::now().timestamp_millis(), uuid::Uuid::new_v4().simple()),
            donor_name: "測試人員".to_string(),
            amount: TEST_ALERT_AMOUNT,
            message: Some("這是一則測試贊助訊息！This is a test donation message.".to_string()),
        }
    }

    pub fn is_test(&self) -> bool {
        self.id.starts_with("test-")
    }
}

const TEST_ALERT_AMOUNT: DonationAmount = match DonationAmount::new(666) {
    Some(amount) => amount,
    None => panic!("666 is positive"),
};

impl From<&Donation> for AlertEvent {
    fn from(donation: &Donation) -> Self {
        Self {
            id: donation.id.to_string(),
            donor_name: donation.donor_name.clone(),
            amount: donation.amount,
            message: donation.message.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_events() {
        let event = AlertEvent::test_event();
        assert!(event.is_test());
        assert_eq!(event.amount.value(), 666);
        assert_eq!(event.donor_name, "測試人員");
    }

    #[test]
    fn test_event_ids_are_unique() {
        let ids = (0..100).map(|_| AlertEvent::test_event().id).collect::<std::collections::HashSet<_>>();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.starts_with("test-")));
    }

    #[test]
    fn wire_format() {
        let event = AlertEvent {
            id: "a1b2c3d4-e5f6-7890-abcd-ef1234567890".into(),
            donor_name: "Alice".into(),
            amount: DonationAmount::try_from(500).unwrap(),
            message: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"id":"a1b2c3d4-e5f6-7890-abcd-ef1234567890","donorName":"Alice","amount":500,"message":null}"#);
    }
}
