//! Token values and their storage digests
//!
//! A token value is 32 random bytes, base64url encoded, and leaves the process exactly once:
//! inside the delivered link. Storage keys tokens by the hex SHA-256 digest of the value.
//! A fast digest is enough since the input already carries 256 bits of entropy.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const VALUE_BYTES: usize = 32;

/// A fresh token value, 43 URL-safe characters drawn from the thread-local CSPRNG.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; VALUE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// The storage key for `token`.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Whether `token` digests to `stored_hash`. The comparison does not short-circuit.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed = hash_token(token);
    computed.len() == stored_hash.len()
        && bool::from(computed.as_bytes().ct_eq(stored_hash.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_values_are_url_safe_and_unique() {
        let values: HashSet<String> = (0..64).map(|_| generate_secure_token()).collect();

        assert_eq!(values.len(), 64);
        for value in &values {
            assert_eq!(value.len(), 43);
            assert!(
                value
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            );
        }
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let digest = hash_token("abc");

        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token("abc"));
        assert_ne!(digest, hash_token("abd"));
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_against_stored_digest() {
        let value = generate_secure_token();
        let stored = hash_token(&value);

        assert!(verify_token_hash(&value, &stored));
        assert!(!verify_token_hash("someone-elses-token", &stored));
        assert!(!verify_token_hash(&value, &stored[..32]));
        assert!(!verify_token_hash(&value, ""));
    }
}
