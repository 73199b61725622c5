//! Payment callback ingestion
//!
//! Gateways report payment results by POSTing a signed, form-encoded body to our `ReturnURL`. Every callback goes
//! through the same steps:
//!
//! 1. **Parse** the body into a flat map. The last value wins if a key is repeated.
//! 2. **Verify** the `CheckMacValue` with the gateway's secrets. Nothing else happens to a callback that fails.
//! 3. **Resolve** the donation: by the echoed donation id (`CustomField1`) if present, then by `MerchantTradeNo`,
//!    then by `TradeNo` (which is the stored reference once a donation has been paid).
//! 4. **Apply** the result. `RtnCode=1` marks the donation as paid. Any other code leaves it alone.
//!
//! Only a fresh `PENDING → SUCCESS` transition publishes an alert, so gateway retries never show up twice on stream.
use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    db_types::{Donation, DonationId, PaymentMethod, Transition},
    events::{AlertEvent, NotificationBus},
    gateways::{Gateways, PaymentGateway, DONATION_ID_FIELD},
    sdg_api::{donation_objects::CallbackOutcome, errors::DonationFlowError},
    traits::DonationLedger,
};

pub const RTN_CODE_FIELD: &str = "RtnCode";
pub const RTN_CODE_SUCCESS: &str = "1";
pub const MERCHANT_TRADE_NO_FIELD: &str = "MerchantTradeNo";
pub const TRADE_NO_FIELD: &str = "TradeNo";

pub struct CallbackApi<B> {
    db: B,
    gateways: Gateways,
    bus: NotificationBus,
}

impl<B> Debug for CallbackApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CallbackApi")
    }
}

impl<B> CallbackApi<B> {
    pub fn new(db: B, gateways: Gateways, bus: NotificationBus) -> Self {
        Self { db, gateways, bus }
    }
}

impl<B> CallbackApi<B>
where B: DonationLedger
{
    /// Processes a raw callback body from the gateway for `method`.
    ///
    /// `Ok` means the gateway should be acknowledged. [`DonationFlowError::MalformedCallback`] and
    /// [`DonationFlowError::SignatureVerificationFailed`] mean it should be told off, and any other error means
    /// that we could not record the result and the gateway should try again later.
    pub async fn process_callback(
        &self,
        method: PaymentMethod,
        body: &[u8],
    ) -> Result<CallbackOutcome, DonationFlowError> {
        let params = parse_callback_body(body)?;
        let gateway = self.gateways.gateway(method);
        if !gateway.verify_callback(&params) {
            warn!(
                "🔄️📨️ {method} callback for trade no. {} failed signature verification. Either someone is tampering \
                 with callbacks, or the {method} hash key and IV are misconfigured.",
                params.get(MERCHANT_TRADE_NO_FIELD).map(String::as_str).unwrap_or("(none)")
            );
            return Err(DonationFlowError::SignatureVerificationFailed);
        }
        trace!("🔄️📨️ {method} callback signature verified");
        let Some(donation) = self.resolve_donation(gateway, &params).await? else {
            warn!("🔄️📨️ Verified {method} callback does not match any donation. Acknowledging anyway. {params:?}");
            return Ok(CallbackOutcome::Unresolved);
        };
        self.apply_result(donation, &params).await
    }

    async fn resolve_donation(
        &self,
        gateway: &dyn PaymentGateway,
        params: &HashMap<String, String>,
    ) -> Result<Option<Donation>, DonationFlowError> {
        let method = gateway.method();
        let mut found = None;
        if let Some(id) = non_empty(params, DONATION_ID_FIELD) {
            found = self.db.fetch_donation_by_id(&DonationId::from(id)).await?;
            if found.is_none() {
                debug!("🔄️📨️ {method} callback carries donation id {id}, but there is no such donation");
            }
        }
        for field in [MERCHANT_TRADE_NO_FIELD, TRADE_NO_FIELD] {
            if found.is_some() {
                break;
            }
            if let Some(reference) = non_empty(params, field) {
                found = self.db.fetch_donation_by_gateway_reference(reference).await?;
            }
        }
        match found {
            Some(donation) if donation.payment_method != method => {
                warn!(
                    "🔄️📨️ Donation {} is paid with {}, but the callback came from {method}. Ignoring it.",
                    donation.id, donation.payment_method
                );
                Ok(None)
            },
            found => Ok(found),
        }
    }

    async fn apply_result(
        &self,
        donation: Donation,
        params: &HashMap<String, String>,
    ) -> Result<CallbackOutcome, DonationFlowError> {
        let rtn_code = params.get(RTN_CODE_FIELD).map(|s| s.trim()).unwrap_or_default();
        if rtn_code != RTN_CODE_SUCCESS {
            info!(
                "🔄️📨️ Payment for donation {} did not succeed. RtnCode: {rtn_code}, RtnMsg: {}",
                donation.id,
                params.get("RtnMsg").map(String::as_str).unwrap_or_default()
            );
            return Ok(CallbackOutcome::NotPaid { donation, rtn_code: rtn_code.to_string() });
        }
        let transaction_id = non_empty(params, TRADE_NO_FIELD)
            .or_else(|| non_empty(params, MERCHANT_TRADE_NO_FIELD))
            .map(str::to_string)
            .or_else(|| donation.gateway_reference.clone())
            .unwrap_or_else(|| donation.id.to_string());
        match self.db.mark_success(&donation.id, &transaction_id).await {
            Ok(Transition::Applied(donation)) => {
                info!(
                    "🔄️💰️ Donation {} of {} from {} has been paid (transaction {transaction_id})",
                    donation.id, donation.amount, donation.donor_name
                );
                self.bus.publish(AlertEvent::from(&donation));
                Ok(CallbackOutcome::Confirmed(donation))
            },
            Ok(Transition::Unchanged(donation)) => {
                debug!("🔄️💰️ Donation {} was already marked as paid. Not alerting again.", donation.id);
                Ok(CallbackOutcome::Duplicate(donation))
            },
            Err(e) => match DonationFlowError::from(e) {
                DonationFlowError::TransitionForbidden { id, status, .. } => {
                    warn!("🔄️💰️ The gateway says donation {id} has been paid, but it is already {status}. Ignoring.");
                    Ok(CallbackOutcome::Conflict(donation))
                },
                e => {
                    error!("🔄️💰️ Could not record the payment for donation {}. {e}", donation.id);
                    Err(e)
                },
            },
        }
    }
}

/// Parses an `application/x-www-form-urlencoded` callback body.
pub fn parse_callback_body(body: &[u8]) -> Result<HashMap<String, String>, DonationFlowError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DonationFlowError::MalformedCallback(format!("Body is not valid UTF-8. {e}")))?;
    if text.trim().is_empty() {
        return Err(DonationFlowError::MalformedCallback("Body is empty".to_string()));
    }
    let params = url::form_urlencoded::parse(text.trim().as_bytes()).into_owned().collect::<HashMap<String, String>>();
    if params.is_empty() {
        return Err(DonationFlowError::MalformedCallback("Body contains no fields".to_string()));
    }
    Ok(params)
}

fn non_empty<'a>(params: &'a HashMap<String, String>, field: &str) -> Option<&'a str> {
    params.get(field).map(|s| s.trim()).filter(|s| !s.is_empty())
}
