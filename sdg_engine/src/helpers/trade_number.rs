use crate::db_types::DonationId;

/// The gateways cap `MerchantTradeNo` at 20 characters.
pub const MAX_TRADE_NUMBER_LENGTH: usize = 20;

/// Derives the merchant trade number for a donation: the id without dashes, truncated to 20 characters.
///
/// The result is stable for a given id, so it can be recomputed at any time and used to find the donation again.
pub fn trade_number_for(id: &DonationId) -> String {
    id.as_str().chars().filter(|c| *c != '-').take(MAX_TRADE_NUMBER_LENGTH).collect()
}
