//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ElectricityToken, Family, Provider, Record, RecordDetails, StoredRecord};
use crate::ports::RecordStore;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Timestamp layout written to TIMESTAMP columns
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Columns in the order `row_to_record` reads them
const RECORD_COLUMNS: &str = "record_id, family, provider, amount, transaction_id,
    customer_name, phone_number, meter_number, token, sequence_number,
    energy_cost, meter_rent, demand_charge, vat, rebate, arrear_amount, vending_amount,
    raw_text, occurred_at::VARCHAR, notes, created_at::VARCHAR";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed record store
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the record database
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process, e.g. two `bp` invocations started at once.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[billpay] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// In-memory store, used by tests and previews
    pub fn in_memory() -> anyhow::Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Extension autoloading stays off: nothing here needs one
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Insert every record in one transaction; on failure none are kept
    fn insert_all(&self, records: &[StoredRecord]) -> Result<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        for (index, stored) in records.iter().enumerate() {
            insert_record(&tx, stored).map_err(|e| {
                Error::database(format!("record {} of {}: {}", index + 1, records.len(), e))
            })?;
        }
        tx.commit()?;
        Ok(())
    }

    fn query_records(
        &self,
        filter: &str,
        params: &[&dyn duckdb::ToSql],
    ) -> Result<Vec<StoredRecord>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_records {} ORDER BY occurred_at DESC, created_at DESC",
            RECORD_COLUMNS, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params, row_to_record)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(records)
    }
}

impl RecordStore for DuckDbRepository {
    fn add_record(&self, record: &Record) -> Result<Uuid> {
        let stored = StoredRecord::new(record.clone());
        let conn = self.conn()?;
        insert_record(&conn, &stored)?;
        Ok(stored.id)
    }

    fn add_records(&self, records: &[Record]) -> Result<Vec<Uuid>> {
        let stored: Vec<StoredRecord> = records.iter().cloned().map(StoredRecord::new).collect();
        self.insert_all(&stored)?;
        Ok(stored.iter().map(|s| s.id).collect())
    }

    fn get_record(&self, id: Uuid) -> Result<Option<StoredRecord>> {
        let mut found = self.query_records("WHERE record_id = ?", &[&id.to_string()])?;
        Ok(found.pop())
    }

    fn list_records(&self) -> Result<Vec<StoredRecord>> {
        self.query_records("", &[])
    }

    fn list_records_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredRecord>> {
        if start > end {
            return Err(Error::validation(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }
        self.query_records(
            "WHERE CAST(occurred_at AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)",
            &[&start.to_string(), &end.to_string()],
        )
    }

    fn list_records_by_family(&self, family: Family) -> Result<Vec<StoredRecord>> {
        self.query_records("WHERE family = ?", &[&family.code()])
    }

    fn list_records_by_provider(&self, provider: Provider) -> Result<Vec<StoredRecord>> {
        self.query_records("WHERE provider = ?", &[&provider.code()])
    }

    fn update_record(&self, stored: &StoredRecord) -> Result<bool> {
        let row = RecordRow::from(stored);
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE sys_records SET
                family = ?, provider = ?, amount = ?,
                transaction_id = ?, customer_name = ?, phone_number = ?,
                meter_number = ?, token = ?, sequence_number = ?,
                energy_cost = ?, meter_rent = ?, demand_charge = ?, vat = ?,
                rebate = ?, arrear_amount = ?, vending_amount = ?,
                raw_text = ?, occurred_at = CAST(? AS TIMESTAMP), notes = ?
             WHERE record_id = ?",
            params![
                row.family,
                row.provider,
                row.amount,
                stored.record.transaction_id,
                stored.record.customer_name,
                row.phone_number,
                row.token.meter_number,
                row.token.token,
                row.token.sequence_number,
                row.energy_cost,
                row.meter_rent,
                row.demand_charge,
                row.vat,
                row.rebate,
                row.arrear_amount,
                row.vending_amount,
                stored.record.raw_text,
                row.occurred_at,
                stored.notes,
                stored.id.to_string(),
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete_record(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM sys_records WHERE record_id = ?",
            [id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    fn count_records(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_records", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn insert_record(conn: &Connection, stored: &StoredRecord) -> Result<()> {
    let row = RecordRow::from(stored);
    conn.execute(
        "INSERT INTO sys_records (
            record_id, family, provider, amount, transaction_id, customer_name,
            phone_number, meter_number, token, sequence_number, energy_cost,
            meter_rent, demand_charge, vat, rebate, arrear_amount, vending_amount,
            raw_text, occurred_at, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
            CAST(? AS TIMESTAMP), ?, CAST(? AS TIMESTAMP))",
        params![
            stored.id.to_string(),
            row.family,
            row.provider,
            row.amount,
            stored.record.transaction_id,
            stored.record.customer_name,
            row.phone_number,
            row.token.meter_number,
            row.token.token,
            row.token.sequence_number,
            row.energy_cost,
            row.meter_rent,
            row.demand_charge,
            row.vat,
            row.rebate,
            row.arrear_amount,
            row.vending_amount,
            stored.record.raw_text,
            row.occurred_at,
            stored.notes,
            row.created_at,
        ],
    )?;
    Ok(())
}

/// Column values of a stored record, flattened for binding
struct RecordRow<'a> {
    family: &'static str,
    provider: Option<&'static str>,
    phone_number: Option<&'a str>,
    token: ElectricityToken,
    amount: String,
    energy_cost: Option<String>,
    meter_rent: Option<String>,
    demand_charge: Option<String>,
    vat: Option<String>,
    rebate: Option<String>,
    arrear_amount: Option<String>,
    vending_amount: Option<String>,
    occurred_at: String,
    created_at: String,
}

impl<'a> From<&'a StoredRecord> for RecordRow<'a> {
    fn from(stored: &'a StoredRecord) -> Self {
        let record = &stored.record;
        let token = record.electricity().cloned().unwrap_or_default();
        let text = |d: Option<Decimal>| d.map(|d| d.to_string());

        Self {
            family: record.family().code(),
            provider: record.provider().map(|p| p.code()),
            phone_number: record.phone_number(),
            amount: record.amount.to_string(),
            energy_cost: text(token.energy_cost),
            meter_rent: text(token.meter_rent),
            demand_charge: text(token.demand_charge),
            vat: text(token.vat),
            rebate: text(token.rebate),
            arrear_amount: text(token.arrear_amount),
            vending_amount: text(token.vending_amount),
            token,
            occurred_at: record.occurred_at.format(TIMESTAMP_FORMAT).to_string(),
            created_at: stored.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> duckdb::Error {
    duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decimal_column(row: &Row, idx: usize) -> duckdb::Result<Option<Decimal>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| Decimal::from_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_column(row: &Row, idx: usize) -> duckdb::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text).ok_or_else(|| {
        conversion_error(idx, Error::database(format!("Bad timestamp: {}", text)))
    })
}

/// Parse the text form DuckDB gives a TIMESTAMP
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)))
}

fn row_to_record(row: &Row) -> duckdb::Result<StoredRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?;

    let family: String = row.get(1)?;
    let family = Family::from_str(&family).map_err(|e| conversion_error(1, e))?;

    let details = match family {
        Family::MobilePayment => {
            let provider: Option<String> = row.get(2)?;
            let provider = match provider {
                Some(code) => Provider::from_str(&code).map_err(|e| conversion_error(2, e))?,
                None => Provider::Other,
            };
            RecordDetails::MobilePayment {
                provider,
                phone_number: row.get(6)?,
            }
        }
        Family::ElectricityToken => RecordDetails::ElectricityToken(ElectricityToken {
            meter_number: row.get(7)?,
            token: row.get(8)?,
            sequence_number: row.get(9)?,
            energy_cost: decimal_column(row, 10)?,
            meter_rent: decimal_column(row, 11)?,
            demand_charge: decimal_column(row, 12)?,
            vat: decimal_column(row, 13)?,
            rebate: decimal_column(row, 14)?,
            arrear_amount: decimal_column(row, 15)?,
            vending_amount: decimal_column(row, 16)?,
        }),
    };

    let record = Record {
        amount: decimal_column(row, 3)?.unwrap_or(Decimal::ZERO),
        transaction_id: row.get(4)?,
        customer_name: row.get(5)?,
        details,
        raw_text: row.get(17)?,
        occurred_at: timestamp_column(row, 18)?,
    };

    Ok(StoredRecord {
        id,
        record,
        notes: row.get(19)?,
        created_at: timestamp_column(row, 20)?,
    })
}
