//! Salted PBKDF2 password hashes in the `method$salt$hash` text form used by
//! Werkzeug, e.g. `pbkdf2:sha256:600000$Xy3kP0qa$9f86d0…`.

use pbkdf2::pbkdf2_hmac;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;
use crate::config::DEFAULT_HASH_ITERATIONS;

pub const SALT_LENGTH: usize = 8;
pub const KEY_LENGTH: usize = 32;

const METHOD_PREFIX: &str = "pbkdf2:sha256";

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    encode_hash(password, &salt, iterations)
}

/// Check `password` against an encoded hash produced by `hash_password`.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored value
/// cannot be parsed.
pub fn verify_password(encoded: &str, password: &str) -> Result<bool, CryptoError> {
    let mut parts = encoded.splitn(3, '$');
    let (method, salt, expected_hex) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(s), Some(h)) => (m, s, h),
        _ => return Err(CryptoError::MalformedHash),
    };

    let iterations = parse_method(method)?;
    let expected = hex::decode(expected_hex).map_err(|_| CryptoError::MalformedHash)?;
    if expected.len() != KEY_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let actual = derive(password, salt, iterations);
    Ok(bool::from(actual.ct_eq(&expected[..])))
}

fn parse_method(method: &str) -> Result<u32, CryptoError> {
    let rest = method
        .strip_prefix(METHOD_PREFIX)
        .ok_or_else(|| CryptoError::UnsupportedMethod(method.to_string()))?;
    match rest {
        "" => Ok(DEFAULT_HASH_ITERATIONS),
        _ => rest
            .strip_prefix(':')
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or(CryptoError::MalformedHash),
    }
}

fn encode_hash(password: &str, salt: &str, iterations: u32) -> String {
    let digest = derive(password, salt, iterations);
    format!("{METHOD_PREFIX}:{iterations}${salt}${}", hex::encode(digest))
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; KEY_LENGTH] {
    let mut out = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    out
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}
