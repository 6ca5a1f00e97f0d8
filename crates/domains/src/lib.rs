//! threadtree/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for threaded discussions:
//! posts, their materialized paths, the typed list-query plan, and the
//! contracts storage adapters implement.

pub mod errors;
pub mod models;
pub mod path;
pub mod ports;
pub mod query;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use path::PostPath;
pub use ports::*;
pub use query::*;
