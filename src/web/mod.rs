//! HTTP surface: routes, middleware, sessions and HTML rendering.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod session;
pub mod templates;
pub mod types;

pub use router::web_router;
pub use server::{start_server_on, WebServer};
