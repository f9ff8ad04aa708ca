//! crates/domains/src/lib.rs
//!
//! Data model, pagination model and port definitions for the feed engine.

pub mod error;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod views;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use ports::*;
pub use views::*;
