use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{AlertSettings, Donation, DonationId, DonationStatus},
    events::{AlertEvent, NotificationBus},
    gateways::{Gateways, PaymentRequest},
    helpers::trade_number_for,
    sdg_api::{
        donation_objects::{DonationCheckout, DonationIntent},
        errors::DonationFlowError,
    },
    traits::{DonationLedger, SettingsStore},
};

pub const DEFAULT_RECENT_DONATIONS_LIMIT: u32 = 20;

/// `DonationFlowApi` handles the donor-facing side of the pipeline: taking a donation request, sending the donor to
/// the right gateway, and listing what has come in.
pub struct DonationFlowApi<B> {
    db: B,
    gateways: Gateways,
    bus: NotificationBus,
}

impl<B> Debug for DonationFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DonationFlowApi")
    }
}

impl<B> DonationFlowApi<B> {
    pub fn new(db: B, gateways: Gateways, bus: NotificationBus) -> Self {
        Self { db, gateways, bus }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Sends a synthetic alert to every connected overlay. Nothing is written to the ledger.
    pub fn publish_test_alert(&self) -> AlertEvent {
        let event = AlertEvent::test_event();
        info!("🔄️🧪️ Publishing test alert {}", event.id);
        self.bus.publish(event.clone());
        event
    }
}

impl<B> DonationFlowApi<B>
where B: DonationLedger
{
    /// The most recent donations, newest first.
    pub async fn recent_donations(&self, limit: u32) -> Result<Vec<Donation>, DonationFlowError> {
        let donations = self.db.fetch_recent_donations(limit).await?;
        trace!("🔄️📋️ Fetched {} recent donations", donations.len());
        Ok(donations)
    }

    /// Rebuilds the signed checkout form for a donation that has not been paid yet.
    pub async fn checkout_form(&self, id: &DonationId) -> Result<PaymentRequest, DonationFlowError> {
        let donation =
            self.db.fetch_donation_by_id(id).await?.ok_or_else(|| DonationFlowError::RecordNotFound(id.clone()))?;
        match donation.status {
            DonationStatus::Pending => {
                let gateway = self.gateways.gateway(donation.payment_method);
                Ok(gateway.build_payment_request(&donation, Utc::now()))
            },
            DonationStatus::Success | DonationStatus::Failed => {
                debug!("🔄️💳️ Checkout requested for donation {id}, but it is already {}", donation.status);
                Err(DonationFlowError::DonationNotPending(id.clone()))
            },
        }
    }
}

impl<B> DonationFlowApi<B>
where B: DonationLedger + SettingsStore
{
    /// Records a new donation and prepares the signed payment request for its gateway.
    ///
    /// The donation is stored as `PENDING`, and its trade number is saved as the gateway reference *before* the
    /// request is signed, so that the gateway's callback can always be matched back to it.
    pub async fn submit_donation(&self, intent: DonationIntent) -> Result<DonationCheckout, DonationFlowError> {
        let new_donation = intent.try_into_new_donation()?;
        let method = new_donation.payment_method;
        let settings = self.db.fetch_alert_settings().await?;
        if !settings.is_enabled(method) {
            info!("🔄️💳️ Donation refused. {method} has been disabled by the streamer.");
            return Err(DonationFlowError::UnsupportedProvider(method.to_string()));
        }
        let donation = self.db.insert_donation(new_donation).await?;
        let trade_no = trade_number_for(&donation.id);
        let donation = self.db.assign_gateway_reference(&donation.id, &trade_no).await?;
        let request = self.gateways.gateway(method).build_payment_request(&donation, Utc::now());
        info!(
            "🔄️💳️ Donation {} of {} from {} is pending payment via {method} (trade no. {trade_no})",
            donation.id, donation.amount, donation.donor_name
        );
        Ok(DonationCheckout {
            donation_id: donation.id,
            action_url: request.action_url,
            payment_params: request.form_fields,
        })
    }

    pub async fn alert_settings(&self) -> Result<AlertSettings, DonationFlowError> {
        let settings = self.db.fetch_alert_settings().await?;
        Ok(settings)
    }
}
