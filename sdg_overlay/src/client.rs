use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use futures::Stream;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
    Response,
};
use sdg_engine::{
    db_types::{AlertSettings, Donation, DonationId},
    donation_objects::DonationIntent,
    events::AlertEvent,
};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::sse_client::alert_events;

/// The donation server's reply to a new donation: where to send the donor, and what to send.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub donation_id: DonationId,
    pub action_url: String,
    pub payment_params: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct DonationServerClient {
    client: Client,
    server: Url,
}

impl DonationServerClient {
    pub fn new(server: Url) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("Stream Donation Gateway Overlay")
            .default_headers(headers)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client. {e}"))?;
        Ok(Self { client, server })
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.server.join(path).map_err(|e| anyhow!("Failed to join URL: {}", e))
    }

    pub async fn health(&self) -> Result<String> {
        let url = self.url("/health")?;
        let res = self.client.get(url).send().await?;
        let response = res.text().await?;
        Ok(response)
    }

    pub async fn alert_settings(&self) -> Result<AlertSettings> {
        self.get_json("/api/settings").await
    }

    pub async fn recent_donations(&self, limit: Option<u32>) -> Result<Vec<Donation>> {
        match limit {
            Some(limit) => self.get_json(&format!("/api/donations?limit={limit}")).await,
            None => self.get_json("/api/donations").await,
        }
    }

    pub async fn submit_donation(&self, intent: &DonationIntent) -> Result<CheckoutResponse> {
        let url = self.url("/api/donations")?;
        let res = self.client.post(url).json(intent).send().await?;
        parse_json(res, "Error submitting donation").await
    }

    /// The link that takes a donor to the gateway's payment page for a pending donation.
    pub fn checkout_link(&self, id: &DonationId) -> Result<Url> {
        self.url(&format!("/checkout/{id}"))
    }

    pub async fn send_test_alert(&self) -> Result<AlertEvent> {
        let url = self.url("/api/alerts/test")?;
        let res = self.client.post(url).send().await?;
        parse_json(res, "Error sending test alert").await
    }

    /// Connects to the live alert stream. The stream ends when the server closes the connection.
    pub async fn alert_stream(&self) -> Result<impl Stream<Item = Result<AlertEvent>>> {
        let url = self.url("/api/alerts/stream")?;
        info!("📡️ Connecting to {url}");
        let res = self.client.get(url).header(ACCEPT, "text/event-stream").send().await?;
        if !res.status().is_success() {
            let msg = error_message(res).await;
            return Err(anyhow!("Could not open the alert stream: {msg}"));
        }
        Ok(alert_events(res.bytes_stream()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        trace!("Fetching {url}");
        let res = self.client.get(url).send().await?;
        parse_json(res, &format!("Error fetching {path}")).await
    }
}

async fn parse_json<T: DeserializeOwned>(res: Response, context: &str) -> Result<T> {
    if !res.status().is_success() {
        let msg = error_message(res).await;
        return Err(anyhow!("{context}: {msg}"));
    }
    Ok(res.json().await?)
}

/// The server reports errors as `{"error": "..."}`. Falls back to the raw body for anything else.
async fn error_message(res: Response) -> String {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(e) => format!("{status}. {}", e.error),
        Err(_) => format!("{status}. {body}"),
    }
}
