//! # storage-adapters
//!
//! Implementations of the `domains` ports. The in-memory store is always
//! compiled; the Postgres store sits behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::InMemoryForum;
