//! HMAC-SHA256 signing for values handed to the browser (the session cookie).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated signing key in bytes.
pub const GENERATED_KEY_LENGTH: usize = 32;

/// Signs and verifies opaque payloads as `base64(payload).base64(tag)`.
#[derive(Clone)]
pub struct Signer {
    mac: HmacSha256,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.is_empty() {
            return Err(CryptoError::InvalidKey);
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// A signer with a random key. Values it signs do not survive a restart.
    pub fn random() -> Result<Self, CryptoError> {
        let key: [u8; GENERATED_KEY_LENGTH] = rand::random();
        Self::new(&key)
    }

    pub fn sign(&self, payload: &[u8]) -> String {
        let tag = self.keyed(payload).finalize().into_bytes();
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(tag)
        )
    }

    /// Return the payload if the signature is valid for this key.
    pub fn verify(&self, signed: &str) -> Option<Vec<u8>> {
        let (payload_b64, tag_b64) = signed.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
        self.keyed(&payload).verify_slice(&tag).ok()?;
        Some(payload)
    }

    fn keyed(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac
    }
}
