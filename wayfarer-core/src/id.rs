//! Prefixed, URL-safe identifiers
//!
//! Record identifiers look like `tok_3xQ9...`: a short type prefix followed by 96 random bits,
//! base64 URL-safe encoded without padding.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::RngCore;

const ID_ENTROPY_BYTES: usize = 12;

/// Generate a `{prefix}_{random}` identifier with 96 bits of entropy.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    format!("{prefix}_{}", BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

/// Check that `id` was produced by [`generate_prefixed_id`] with `expected_prefix`.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    BASE64_URL_SAFE_NO_PAD
        .decode(random_part)
        .map(|decoded| decoded.len() >= ID_ENTROPY_BYTES)
        .unwrap_or(false)
}
