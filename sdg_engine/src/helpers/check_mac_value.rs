//! # CheckMacValue signatures
//!
//! ECPay and O'Pay authenticate every form they exchange with a `CheckMacValue` field. The same digest is used to sign
//! the outbound payment form and to verify the asynchronous payment callback.
//!
//! The digest is computed as follows:
//! 1. Sort the parameters by the lower-cased key (ordinal comparison).
//! 2. Join them as `k1=v1&k2=v2...`, keeping the original key casing and the raw values.
//! 3. Wrap the result as `HashKey=<key>&<joined>&HashIV=<iv>`.
//! 4. Percent-encode the whole string the way JavaScript's `encodeURIComponent` does, then turn `%20` into `+`.
//! 5. Lower-case the encoded string.
//! 6. Hash it with SHA-256 and render the digest as upper-case hex.
use std::collections::HashMap;

use log::*;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// The name of the signature field in both outbound forms and inbound callbacks.
pub const CHECK_MAC_FIELD: &str = "CheckMacValue";

/// Characters that `encodeURIComponent` leaves alone, but `urlencoding` escapes. Matched after lower-casing.
const URI_COMPONENT_MARKS: [(&str, &str); 5] = [("%21", "!"), ("%2a", "*"), ("%27", "'"), ("%28", "("), ("%29", ")")];

/// Calculates the `CheckMacValue` for the given parameters.
///
/// The `CheckMacValue` field itself must not be part of `params`. Use [`verify_check_mac_value`] for inbound data that
/// carries the field.
pub fn generate_check_mac_value<'a, I>(params: I, hash_key: &str, hash_iv: &str) -> String
where I: IntoIterator<Item = (&'a str, &'a str)> {
    let encoded = canonical_string(params, hash_key, hash_iv);
    let digest = Sha256::digest(encoded.as_bytes());
    hex::encode_upper(digest)
}

/// Checks the `CheckMacValue` carried in `params` against the digest of every other field.
///
/// A missing `CheckMacValue` never verifies. The supplied digest must match exactly, upper-case hex with no padding.
/// The comparison runs in constant time.
pub fn verify_check_mac_value(params: &HashMap<String, String>, hash_key: &str, hash_iv: &str) -> bool {
    let Some(supplied) = params.get(CHECK_MAC_FIELD) else {
        debug!("🔏️ No {CHECK_MAC_FIELD} field was supplied");
        return false;
    };
    let fields = params.iter().filter(|(k, _)| k.as_str() != CHECK_MAC_FIELD).map(|(k, v)| (k.as_str(), v.as_str()));
    let expected = generate_check_mac_value(fields, hash_key, hash_iv);
    let matched: bool = expected.as_bytes().ct_eq(supplied.as_bytes()).into();
    if !matched {
        trace!("🔏️ CheckMacValue mismatch. Expected {expected}, got {supplied}");
    }
    matched
}

/// Produces the lower-cased, percent-encoded string that gets hashed.
pub(crate) fn canonical_string<'a, I>(params: I, hash_key: &str, hash_iv: &str) -> String
where I: IntoIterator<Item = (&'a str, &'a str)> {
    let mut params = params.into_iter().collect::<Vec<_>>();
    params.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    let joined = params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    let raw = format!("HashKey={hash_key}&{joined}&HashIV={hash_iv}");
    let mut encoded = urlencoding::encode(&raw).to_lowercase();
    for (escaped, mark) in URI_COMPONENT_MARKS {
        encoded = encoded.replace(escaped, mark);
    }
    encoded.replace("%20", "+")
}
