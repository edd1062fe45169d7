//! Billpay Core - SMS payment parsing and ledger
//!
//! Turns Bangladeshi mobile-money and prepaid-electricity SMS notifications
//! into structured records and keeps them in a local ledger:
//!
//! - **parser**: pure classification and field extraction
//! - **domain**: records and error types
//! - **ports**: the storage trait
//! - **services**: ingest, history, statistics, logging, migrations
//! - **adapters**: DuckDB storage

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod parser;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

pub use domain::result::Error;
pub use domain::{ElectricityToken, Family, Provider, Record, RecordDetails, StoredRecord};
pub use parser::parse;
pub use ports::RecordStore;
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for billpay operations
///
/// Holds the configuration, the record store and the services wired to it.
pub struct BillpayContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub ingest_service: IngestService,
    pub history_service: HistoryService,
    pub statistics_service: StatisticsService,
}

impl BillpayContext {
    /// Open the ledger in `billpay_dir`, creating and migrating it if needed
    pub fn new(billpay_dir: &Path) -> Result<Self> {
        let config = Config::load(billpay_dir)?;

        let db_path = billpay_dir.join(config::DATABASE_FILE);
        let repository = Arc::new(
            DuckDbRepository::new(&db_path)
                .with_context(|| format!("Failed to open {}", db_path.display()))?,
        );
        repository.ensure_schema()?;

        let store: Arc<dyn RecordStore> = repository.clone();

        Ok(Self {
            config,
            ingest_service: IngestService::new(Arc::clone(&store)),
            history_service: HistoryService::new(Arc::clone(&store)),
            statistics_service: StatisticsService::new(store),
            repository,
        })
    }
}
