//! # services
//!
//! Use cases for threaded posts. Adapters are injected through the ports
//! declared in `domains`.

pub mod posts;

pub use posts::PostService;
