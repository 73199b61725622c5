use std::{env, time::Duration};

use log::*;
use sdg_common::parse_boolean_flag;
use sdg_engine::{
    db_types::PaymentMethod,
    events::DEFAULT_ALERT_BUFFER_SIZE,
    gateways::{GatewayConfig, DEFAULT_TRADE_TZ_OFFSET_HOURS},
};

const DEFAULT_SDG_HOST: &str = "127.0.0.1";
const DEFAULT_SDG_PORT: u16 = 8360;
const DEFAULT_SDG_DATABASE_URL: &str = "sqlite://data/donations.db";
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The public base URL of this server. Gateway callbacks are sent to `<base_url>/api/payment/<gw>/callback`.
    pub base_url: String,
    pub ecpay: GatewayConfig,
    pub opay: GatewayConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// How far an overlay may fall behind the alert stream before it starts skipping alerts.
    pub alert_buffer_size: usize,
    /// How often a comment is sent on an idle alert stream to keep proxies from closing it.
    pub keep_alive: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let base_url = format!("http://{DEFAULT_SDG_HOST}:{DEFAULT_SDG_PORT}");
        Self {
            host: DEFAULT_SDG_HOST.to_string(),
            port: DEFAULT_SDG_PORT,
            database_url: DEFAULT_SDG_DATABASE_URL.to_string(),
            ecpay: GatewayConfig::staging(PaymentMethod::EcPay).with_callback_base_url(base_url.as_str()),
            opay: GatewayConfig::staging(PaymentMethod::OPay).with_callback_base_url(base_url.as_str()),
            base_url,
            use_x_forwarded_for: false,
            use_forwarded: false,
            alert_buffer_size: DEFAULT_ALERT_BUFFER_SIZE,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SDG_HOST").ok().unwrap_or_else(|| DEFAULT_SDG_HOST.into());
        let port = env::var("SDG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SDG_PORT. {e} Using the default, {DEFAULT_SDG_PORT}, instead."
                    );
                    DEFAULT_SDG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SDG_PORT);
        let database_url = env::var("SDG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SDG_DATABASE_URL is not set. Using {DEFAULT_SDG_DATABASE_URL}.");
            DEFAULT_SDG_DATABASE_URL.to_string()
        });
        let base_url = env::var("SDG_BASE_URL").ok().map(|s| s.trim_end_matches('/').to_string()).unwrap_or_else(|| {
            let url = format!("http://{host}:{port}");
            warn!(
                "🪛️ SDG_BASE_URL is not set. Payment gateways will be told to send callbacks to {url}, which they \
                 probably cannot reach."
            );
            url
        });
        let trade_tz_offset_hours = configure_trade_timezone();
        let ecpay = gateway_config_from_env(PaymentMethod::EcPay, &base_url, trade_tz_offset_hours);
        let opay = gateway_config_from_env(PaymentMethod::OPay, &base_url, trade_tz_offset_hours);
        let use_x_forwarded_for = parse_boolean_flag(env::var("SDG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SDG_USE_FORWARDED").ok(), false);
        let alert_buffer_size = env::var("SDG_ALERT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SDG_ALERT_BUFFER_SIZE. {e}"))
                    .ok()
            })
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_ALERT_BUFFER_SIZE);
        let keep_alive = env::var("SDG_KEEP_ALIVE_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SDG_KEEP_ALIVE_SECS. {e}"))
                    .ok()
            })
            .filter(|&n| n > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_KEEP_ALIVE);
        Self {
            host,
            port,
            database_url,
            base_url,
            ecpay,
            opay,
            use_x_forwarded_for,
            use_forwarded,
            alert_buffer_size,
            keep_alive,
        }
    }
}

fn configure_trade_timezone() -> i32 {
    env::var("SDG_TRADE_TZ_OFFSET_HOURS")
        .map_err(|_| {
            info!(
                "🪛️ SDG_TRADE_TZ_OFFSET_HOURS is not set. Using the default of UTC+{DEFAULT_TRADE_TZ_OFFSET_HOURS}."
            )
        })
        .and_then(|s| {
            s.parse::<i32>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for SDG_TRADE_TZ_OFFSET_HOURS. {e}"))
                .and_then(|h| {
                    if (-23..=23).contains(&h) {
                        Ok(h)
                    } else {
                        warn!("🪛️ SDG_TRADE_TZ_OFFSET_HOURS must be between -23 and 23, but was {h}");
                        Err(())
                    }
                })
        })
        .unwrap_or(DEFAULT_TRADE_TZ_OFFSET_HOURS)
}

/// Reads `SDG_<GW>_MERCHANT_ID`, `SDG_<GW>_HASH_KEY`, `SDG_<GW>_HASH_IV` and `SDG_<GW>_ACTION_URL`.
///
/// The three credentials go together. If any one of them is missing, the gateway's staging credentials are used.
fn gateway_config_from_env(method: PaymentMethod, base_url: &str, trade_tz_offset_hours: i32) -> GatewayConfig {
    let prefix = format!("SDG_{method}");
    let var = |name: &str| env::var(format!("{prefix}_{name}")).ok().filter(|s| !s.trim().is_empty());
    let mut config = GatewayConfig::staging(method).with_callback_base_url(base_url);
    config.trade_tz_offset_hours = trade_tz_offset_hours;
    match (var("MERCHANT_ID"), var("HASH_KEY"), var("HASH_IV")) {
        (Some(merchant_id), Some(hash_key), Some(hash_iv)) => {
            info!("🪛️ {method} merchant id: {merchant_id}");
            config = config.with_credentials(merchant_id.trim(), hash_key.trim(), hash_iv.trim());
        },
        _ => {
            warn!(
                "🚨️ {prefix}_MERCHANT_ID, {prefix}_HASH_KEY and {prefix}_HASH_IV are not all set. Using the public \
                 {method} staging merchant ({}). Do not take real donations like this.",
                config.merchant_id
            );
        },
    }
    if let Some(action_url) = var("ACTION_URL") {
        info!("🪛️ {method} checkout forms will be posted to {action_url}");
        config.action_url = action_url;
    }
    config
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that request handlers need. It carries no secrets.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub keep_alive: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            keep_alive: config.keep_alive,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_uses_staging_merchants() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.ecpay.merchant_id, "3002599");
        assert_eq!(config.opay.merchant_id, "2000132");
        assert_eq!(config.ecpay.callback_base_url, "http://127.0.0.1:8360");
        assert_eq!(config.keep_alive, Duration::from_secs(15));
        let options = ServerOptions::from_config(&config);
        assert!(!options.use_forwarded && !options.use_x_forwarded_for);
    }

    #[test]
    fn gateway_credentials_from_env() {
        env::set_var("SDG_OPAY_MERCHANT_ID", "1234567");
        env::set_var("SDG_OPAY_HASH_KEY", "key");
        env::set_var("SDG_OPAY_HASH_IV", " iv ");
        env::set_var("SDG_OPAY_ACTION_URL", "https://payment-stage.opay.tw/Cashier/AioCheckOut/V5");
        let config = gateway_config_from_env(PaymentMethod::OPay, "https://donate.example.com", 0);
        assert_eq!(config.merchant_id, "1234567");
        assert_eq!(config.hash_key.reveal(), "key");
        assert_eq!(config.hash_iv.reveal(), "iv");
        assert_eq!(config.action_url, "https://payment-stage.opay.tw/Cashier/AioCheckOut/V5");
        assert_eq!(config.callback_base_url, "https://donate.example.com");
        assert_eq!(config.trade_tz_offset_hours, 0);
    }

    #[test]
    fn partial_credentials_fall_back_to_staging() {
        env::remove_var("SDG_ECPAY_HASH_IV");
        env::set_var("SDG_ECPAY_MERCHANT_ID", "9999999");
        env::set_var("SDG_ECPAY_HASH_KEY", "key");
        let config = gateway_config_from_env(PaymentMethod::EcPay, "http://localhost", 8);
        assert_eq!(config.merchant_id, "3002599");
        assert_eq!(config.hash_key.reveal(), "spPjZn66i0OhqJsQ");
    }
}
