//! Request handler definitions
//!
//! Define each route and it handler here. Payment gateway callbacks live in [`crate::payment_routes`].
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database access in particular) must be awaited, never
//! blocked on.
use actix_web::{get, http::header, web, HttpRequest, HttpResponse, Responder};
use log::*;
use sdg_engine::{
    db_types::DonationId,
    donation_objects::DonationIntent,
    events::NotificationBus,
    sdg_api::donation_flow_api::DEFAULT_RECENT_DONATIONS_LIMIT,
    DonationFlowApi,
    DonationLedger,
    SettingsStore,
};
use serde::Deserialize;

use crate::{config::ServerOptions, errors::ServerError, helpers::get_remote_ip, sse::alert_event_stream};

/// The most donations `GET /api/donations` will return in one go.
pub const MAX_RECENT_DONATIONS_LIMIT: u32 = 100;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `route!(name => Method "/path" impl Trait1, Trait2)` registers the handler `name::<B>` for any backend `B` that
// implements all of the listed traits.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Donations  ----------------------------------------------------
route!(submit_donation => Post "/donations" impl DonationLedger, SettingsStore);
/// Takes a donation request from the donation page.
///
/// The body is a JSON [`DonationIntent`]. On success the donation is stored as `PENDING` and the response carries the
/// signed form that the page must post to the gateway: `{ donationId, actionUrl, paymentParams }`.
///
/// Validation problems and unknown or disabled payment methods are `400`s.
pub async fn submit_donation<B>(
    body: web::Json<DonationIntent>,
    api: web::Data<DonationFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: DonationLedger + SettingsStore,
{
    let intent = body.into_inner();
    debug!("💻️ Donation request from {} for {} via {}", intent.donor_name, intent.amount, intent.payment_method);
    let checkout = api.submit_donation(intent).await.map_err(|e| {
        debug!("💻️ Donation request refused. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(checkout))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RecentDonationsQuery {
    pub limit: Option<u32>,
}

route!(recent_donations => Get "/donations" impl DonationLedger);
/// The most recent donations, newest first. Use `?limit=n` to change how many (at most 100).
pub async fn recent_donations<B: DonationLedger>(
    query: web::Query<RecentDonationsQuery>,
    api: web::Data<DonationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_DONATIONS_LIMIT).min(MAX_RECENT_DONATIONS_LIMIT);
    trace!("💻️ Fetching the {limit} most recent donations");
    let donations = api.recent_donations(limit).await?;
    Ok(HttpResponse::Ok().json(donations))
}

route!(checkout_form => Get "/checkout/{donation_id}" impl DonationLedger);
/// Serves a page that posts the signed payment form for a pending donation to its gateway straight away.
///
/// This is what a donation page without JavaScript form handling links to.
pub async fn checkout_form<B: DonationLedger>(
    path: web::Path<String>,
    api: web::Data<DonationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = DonationId::from(path.into_inner());
    debug!("💻️ Checkout form requested for donation {id}");
    let request = api.checkout_form(&id).await?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(request.to_html_form()))
}

//----------------------------------------------   Alerts  ----------------------------------------------------
route!(alert_settings => Get "/settings" impl DonationLedger, SettingsStore);
/// The streamer's alert settings, for the overlay. Read-only.
pub async fn alert_settings<B>(api: web::Data<DonationFlowApi<B>>) -> Result<HttpResponse, ServerError>
where B: DonationLedger + SettingsStore {
    let settings = api.alert_settings().await?;
    Ok(HttpResponse::Ok().json(settings))
}

route!(test_alert => Post "/alerts/test" impl DonationLedger);
/// Sends a made-up donation to every connected overlay, so the streamer can check their setup. Nothing is recorded.
pub async fn test_alert<B: DonationLedger>(api: web::Data<DonationFlowApi<B>>) -> HttpResponse {
    let event = api.publish_test_alert();
    HttpResponse::Ok().json(event)
}

/// The live alert stream, as server-sent events. Each confirmed donation arrives as a `new-donation` event.
///
/// Connections only see alerts published after they connect.
#[get("/alerts/stream")]
pub async fn alert_stream(
    req: HttpRequest,
    bus: web::Data<NotificationBus>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    info!(
        "💻️ Overlay connected to the alert stream from {}. {} subscriber(s) before this one.",
        peer.map(|ip| ip.to_string()).unwrap_or_else(|| "an unknown address".into()),
        bus.subscriber_count()
    );
    let stream = alert_event_stream(bus.subscribe(), options.keep_alive);
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream)
}
