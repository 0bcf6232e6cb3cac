use std::sync::Arc;

use crate::core_state::CoreState;

/// Shared context for all routes and middleware.
///
/// Middleware reads it from request extensions, handlers from `State`.
#[derive(Clone)]
pub struct WebContext {
    pub core: Arc<CoreState>,
}

impl WebContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Per-request id, injected by the access-log middleware.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::random();
        Self(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_hex_and_distinct() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_eq!(a.0.len(), 16);
        assert!(a.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.0, b.0);
    }
}
