pub mod password;
pub mod signing;

pub use password::*;
pub use signing::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Unsupported password hash method: {0}")]
    UnsupportedMethod(String),

    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Invalid signing key")]
    InvalidKey,
}
