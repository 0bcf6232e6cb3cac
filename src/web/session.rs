//! Browser sessions kept entirely in a signed cookie.
//!
//! The cookie value is `Signer::sign(json(SessionData))`. Nothing is stored
//! server side, so a session outlives a restart as long as the secret key is
//! configured.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::crypto::signing::Signer;

pub const SESSION_COOKIE: &str = "session";

/// What the cookie carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Set by login and registration, cleared by logout.
    #[serde(default)]
    pub logged_in: bool,
    /// `None` for a session opened by a registration that was discarded as a
    /// duplicate.
    #[serde(default)]
    pub account_id: Option<i64>,
    /// One-shot messages shown by the next rendered page.
    #[serde(default)]
    pub flashes: Vec<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    data: SessionData,
    changed: bool,
}

/// Per-request session handle, inserted into request extensions by
/// `middleware::session`. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                data,
                changed: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock still holds consistent plain data
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().data.logged_in
    }

    /// The stored account behind this session, if any.
    pub fn account_id(&self) -> Option<i64> {
        let state = self.state();
        if state.data.logged_in {
            state.data.account_id
        } else {
            None
        }
    }

    pub fn log_in(&self, account_id: Option<i64>) {
        let mut state = self.state();
        state.data.logged_in = true;
        state.data.account_id = account_id;
        state.changed = true;
    }

    pub fn log_out(&self) {
        let mut state = self.state();
        state.data.logged_in = false;
        state.data.account_id = None;
        state.changed = true;
    }

    pub fn flash(&self, message: impl Into<String>) {
        let mut state = self.state();
        state.data.flashes.push(message.into());
        state.changed = true;
    }

    /// Remove and return pending flash messages.
    pub fn take_flashes(&self) -> Vec<String> {
        let mut state = self.state();
        if state.data.flashes.is_empty() {
            return Vec::new();
        }
        state.changed = true;
        std::mem::take(&mut state.data.flashes)
    }

    /// The data to write back, if anything changed during the request.
    pub fn changed_data(&self) -> Option<SessionData> {
        let state = self.state();
        state.changed.then(|| state.data.clone())
    }
}

/// Find the session cookie in the request headers and check its signature.
/// A missing, tampered or unreadable cookie yields an empty session.
pub fn read_cookie(headers: &HeaderMap, signer: &Signer) -> SessionData {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| signer.verify(value))
        .and_then(|payload| serde_json::from_slice(&payload).ok())
        .unwrap_or_default()
}

/// Build the `Set-Cookie` header value for `data`.
pub fn cookie_header(data: &SessionData, signer: &Signer) -> Option<HeaderValue> {
    let payload = serde_json::to_vec(data).ok()?;
    let value = signer.sign(&payload);
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

/// Append the cookie for `data` to a response's headers.
pub fn write_cookie(headers: &mut HeaderMap, data: &SessionData, signer: &Signer) {
    match cookie_header(data, signer) {
        Some(value) => {
            headers.append(SET_COOKIE, value);
        }
        None => tracing::error!("Failed to encode session cookie"),
    }
}
