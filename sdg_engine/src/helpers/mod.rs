mod check_mac_value;
mod trade_number;

pub use check_mac_value::{generate_check_mac_value, verify_check_mac_value, CHECK_MAC_FIELD};
pub use trade_number::{trade_number_for, MAX_TRADE_NUMBER_LENGTH};
