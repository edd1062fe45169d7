//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The parsing core
//! never touches them; services and adapters do.

mod repository;

pub use repository::RecordStore;
