//! Record store port - storage abstraction for parsed records

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Family, Provider, Record, StoredRecord};

/// Storage for parsed payment records
///
/// Listings are ordered newest first by `occurred_at`. Implementations
/// keep absent optional fields absent: they are never stored as empty
/// strings or zeros.
pub trait RecordStore: Send + Sync {
    /// Insert a freshly parsed record, returning its new id
    fn add_record(&self, record: &Record) -> Result<Uuid>;

    /// Insert several records atomically: either all are stored or none are
    fn add_records(&self, records: &[Record]) -> Result<Vec<Uuid>>;

    /// Get a record by id
    fn get_record(&self, id: Uuid) -> Result<Option<StoredRecord>>;

    /// All records
    fn list_records(&self) -> Result<Vec<StoredRecord>>;

    /// Records whose `occurred_at` date falls within `start..=end`
    fn list_records_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StoredRecord>>;

    /// Records of one family
    fn list_records_by_family(&self, family: Family) -> Result<Vec<StoredRecord>>;

    /// Mobile-money records from one provider
    fn list_records_by_provider(&self, provider: Provider) -> Result<Vec<StoredRecord>>;

    /// Overwrite a stored record; returns false when the id is unknown
    fn update_record(&self, record: &StoredRecord) -> Result<bool>;

    /// Delete a record; returns false when the id is unknown
    fn delete_record(&self, id: Uuid) -> Result<bool>;

    /// Number of stored records
    fn count_records(&self) -> Result<i64>;
}
