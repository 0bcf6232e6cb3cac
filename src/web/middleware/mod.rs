//! Middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: request id, method, path, status, latency
//! 2. Session: load the signed cookie, write it back if it changed
//! 3. Login gate: only on workflow routes, only when `require_login` is set

pub mod access;
pub mod auth;
pub mod session;
