//! Core domain entities
//!
//! Pure data structures with no I/O: the parsed payment record, its
//! family/provider enumerations, and the library error type.

mod record;
pub mod result;

pub use record::{ElectricityToken, Family, Provider, Record, RecordDetails, StoredRecord};
