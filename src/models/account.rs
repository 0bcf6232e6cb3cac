use serde::{Deserialize, Serialize};

/// A registered hospital. Rows in `users` are written once at registration
/// and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub hospital: String,
    pub code: String,
    /// Encoded PBKDF2 hash, see `crypto::password`.
    pub password_hash: String,
}

/// Account fields as submitted at registration, password already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub hospital: String,
    pub code: String,
    pub password_hash: String,
}
