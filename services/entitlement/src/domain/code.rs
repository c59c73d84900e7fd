//! One-time code generation and comparison.

use rand::RngExt;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// `len` decimal digits from the thread-local CSPRNG. Leading zeros are kept.
pub fn generate_numeric_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Hex SHA-256 of a code, so stored records never hold the plaintext.
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Compare without leaking the position of the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

/// Whether `submitted` hashes to `stored_hash`.
pub fn code_matches(submitted: &str, stored_hash: &str) -> bool {
    constant_time_eq(&hash_code(submitted.trim()), stored_hash)
}
