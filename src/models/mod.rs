pub mod account;
pub mod patient;

pub use account::*;
pub use patient::*;
