//! Repository layer: entity-scoped database operations.
//!
//! Function-based: every call takes the connection it runs on.

mod account;
mod patient;

pub use account::*;
pub use patient::*;
