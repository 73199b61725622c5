//! Payment gateway callbacks
//!
//! Both gateways POST their payment results here as `application/x-www-form-urlencoded` bodies, and expect a plain
//! text answer: `1|OK` means "received", and `0|ErrorMessage` makes them try again later. The gateways only know these
//! two strings, so the reason for a rejection goes to the log and the status code, never to the body.
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use log::*;
use sdg_engine::{db_types::PaymentMethod, CallbackApi, DonationFlowError, DonationLedger};

use crate::{config::ServerOptions, helpers::get_remote_ip, route};

pub const ACK_OK: &str = "1|OK";
pub const ACK_ERROR: &str = "0|ErrorMessage";

route!(ecpay_callback => Post "/payment/ecpay/callback" impl DonationLedger);
pub async fn ecpay_callback<B: DonationLedger>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<CallbackApi<B>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    gateway_callback(PaymentMethod::EcPay, &req, &body, &api, &options).await
}

route!(opay_callback => Post "/payment/opay/callback" impl DonationLedger);
pub async fn opay_callback<B: DonationLedger>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<CallbackApi<B>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    gateway_callback(PaymentMethod::OPay, &req, &body, &api, &options).await
}

async fn gateway_callback<B: DonationLedger>(
    method: PaymentMethod,
    req: &HttpRequest,
    body: &[u8],
    api: &CallbackApi<B>,
    options: &ServerOptions,
) -> HttpResponse {
    let peer = get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded);
    debug!("💳️ {method} callback received from {peer:?} ({} bytes)", body.len());
    match api.process_callback(method, body).await {
        Ok(outcome) => {
            info!("💳️ {method} callback processed. {outcome}");
            acknowledge(StatusCode::OK, ACK_OK)
        },
        Err(e) => {
            let status = rejection_status(&e);
            warn!("💳️ {method} callback from {peer:?} was rejected with {status}. {e}");
            acknowledge(status, ACK_ERROR)
        },
    }
}

/// Forged and unreadable callbacks are client errors. Anything else is our problem, and the gateway should retry.
fn rejection_status(e: &DonationFlowError) -> StatusCode {
    match e {
        DonationFlowError::MalformedCallback(_) | DonationFlowError::SignatureVerificationFailed => {
            StatusCode::BAD_REQUEST
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn acknowledge(status: StatusCode, body: &'static str) -> HttpResponse {
    HttpResponse::build(status).content_type("text/plain; charset=utf-8").body(body)
}
