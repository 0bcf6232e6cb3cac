//! Application state shared by every request.
//!
//! Built once at startup and wrapped in `Arc`. The classifier is read-only
//! after load; the SQLite connection is the only mutable resource and sits
//! behind a `Mutex`.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::crypto::signing::Signer;
use crate::crypto::CryptoError;
use crate::db;
use crate::inference::{InferenceAdapter, InferenceError};
use crate::uploads::{UploadError, UploadStore};

pub struct CoreState {
    db: Mutex<Connection>,
    pub inference: InferenceAdapter,
    pub uploads: UploadStore,
    pub signer: Signer,
    pub config: AppConfig,
}

impl CoreState {
    /// Open the database, create the upload directory, load the classifier and
    /// set up the session signer from `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let conn = db::open_database(&config.database_path)?;
        let uploads = UploadStore::open(&config.upload_dir)?;
        let inference = InferenceAdapter::load(&config.model_path)?;
        Self::with_parts(config, conn, uploads, inference)
    }

    /// Assemble state from pre-built parts. Tests use this with an in-memory
    /// database and a stub classifier.
    pub fn with_parts(
        config: AppConfig,
        conn: Connection,
        uploads: UploadStore,
        inference: InferenceAdapter,
    ) -> Result<Self, CoreError> {
        let signer = match &config.secret_key {
            Some(key) => Signer::new(key)?,
            None => {
                tracing::warn!(
                    "No secret key configured; using a random key. Sessions will not survive a restart"
                );
                Signer::random()?
            }
        };

        Ok(Self {
            db: Mutex::new(conn),
            inference,
            uploads,
            signer,
            config,
        })
    }

    /// Lock the shared connection. Hold the guard only for synchronous work.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Upload store error: {0}")]
    Upload(#[from] UploadError),
    #[error("Model error: {0}")]
    Inference(#[from] InferenceError),
    #[error("Key error: {0}")]
    Crypto(#[from] CryptoError),
}
