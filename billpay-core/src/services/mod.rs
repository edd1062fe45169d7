//! Service layer - business logic orchestration
//!
//! Services coordinate the parser and the record store. Each service
//! focuses on a specific use case.

mod history;
mod ingest;
pub mod logging;
pub mod migration;
pub mod statistics;

pub use history::{HistoryFilter, HistoryService};
pub use ingest::{split_messages, IngestOutcome, IngestResult, IngestService, IngestedRecord};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use statistics::{
    summarize, ElectricityTotals, ProviderTotals, Statistics, StatisticsService, Tally,
};
