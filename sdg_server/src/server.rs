use std::time::Duration;

use actix_web::{dev::Server, error::JsonPayloadError, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use sdg_engine::{events::NotificationBus, gateways::Gateways, CallbackApi, DonationFlowApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    payment_routes::{EcpayCallbackRoute, OpayCallbackRoute},
    routes::{
        alert_stream,
        health,
        AlertSettingsRoute,
        CheckoutFormRoute,
        RecentDonationsRoute,
        SubmitDonationRoute,
        TestAlertRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("🗃️ Database at {} is ready", db.url());
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the server. The gateways and the notification bus are created once here and shared by every worker, so
/// that a callback handled by one worker reaches overlays connected to any other.
pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let gateways = Gateways::new(config.ecpay.clone(), config.opay.clone());
    let bus = NotificationBus::new(config.alert_buffer_size);
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let flow_api = DonationFlowApi::new(db.clone(), gateways.clone(), bus.clone());
        let callback_api = CallbackApi::new(db.clone(), gateways.clone(), bus.clone());
        let api_scope = web::scope("/api")
            .service(SubmitDonationRoute::<SqliteDatabase>::new())
            .service(RecentDonationsRoute::<SqliteDatabase>::new())
            .service(AlertSettingsRoute::<SqliteDatabase>::new())
            .service(TestAlertRoute::<SqliteDatabase>::new())
            .service(alert_stream)
            .service(EcpayCallbackRoute::<SqliteDatabase>::new())
            .service(OpayCallbackRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sdg::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(callback_api))
            .app_data(web::Data::new(bus.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(CheckoutFormRoute::<SqliteDatabase>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies get the same `{"error": ...}` treatment as every other client error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            e => e.to_string(),
        };
        debug!("💻️ Rejected request body. {message}");
        ServerError::InvalidRequestBody(message).into()
    })
}
