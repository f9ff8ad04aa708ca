//! # storage-adapters
//!
//! Implementations of the `domains` ports.
//!
//! | Adapter             | Feature       | Ports                                   |
//! |---------------------|---------------|-----------------------------------------|
//! | `MemoryStore`       | always        | every repository, `AccessOracle`, files |
//! | `PgStore`           | `db-postgres` | every repository, `AccessOracle`        |
//! | `LocalFileResolver` | `media-local` | `FileResolver`                          |

pub mod memory;

#[cfg(feature = "media-local")]
pub mod files;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::{MemoryStore, NewImage, UserRecord};

#[cfg(feature = "media-local")]
pub use files::LocalFileResolver;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
