use sdg_engine::{
    db_types::PaymentMethod,
    events::NotificationBus,
    gateways::{GatewayConfig, Gateways},
    helpers::{generate_check_mac_value, CHECK_MAC_FIELD},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CallbackApi,
    DonationFlowApi,
    SqliteDatabase,
};

pub struct TestSystem {
    pub db: SqliteDatabase,
    pub bus: NotificationBus,
    pub flow: DonationFlowApi<SqliteDatabase>,
    pub callbacks: CallbackApi<SqliteDatabase>,
}

pub async fn setup() -> TestSystem {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let bus = NotificationBus::default();
    let gateways = Gateways::default();
    let flow = DonationFlowApi::new(db.clone(), gateways.clone(), bus.clone());
    let callbacks = CallbackApi::new(db.clone(), gateways, bus.clone());
    TestSystem { db, bus, flow, callbacks }
}

/// Signs `params` the way the gateway would, and encodes them as a callback body.
pub fn signed_callback(method: PaymentMethod, params: &[(&str, &str)]) -> Vec<u8> {
    let config = GatewayConfig::staging(method);
    let mac = generate_check_mac_value(params.iter().copied(), config.hash_key.reveal(), config.hash_iv.reveal());
    let mut body = url::form_urlencoded::Serializer::new(String::new());
    body.extend_pairs(params.iter().copied());
    body.append_pair(CHECK_MAC_FIELD, &mac);
    body.finish().into_bytes()
}

pub fn paid_callback<'a>(
    trade_no: &'a str,
    trade_id: &'a str,
    donation_id: Option<&'a str>,
) -> Vec<(&'a str, &'a str)> {
    let mut params = vec![
        ("MerchantID", "3002599"),
        ("MerchantTradeNo", trade_no),
        ("RtnCode", "1"),
        ("RtnMsg", "Succeeded"),
        ("TradeNo", trade_id),
        ("TradeAmt", "500"),
        ("PaymentDate", "2024/01/05 13:05:10"),
        ("PaymentType", "Credit_CreditCard"),
        ("TradeDate", "2024/01/05 13:04:09"),
        ("SimulatePaid", "0"),
    ];
    if let Some(id) = donation_id {
        params.push(("CustomField1", id));
    }
    params
}
