//! History service - browsing and editing stored records

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::result::Error;
use crate::domain::{Family, Provider, StoredRecord};
use crate::ports::RecordStore;

/// Optional filters for listing records; all set filters must match
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub family: Option<Family>,
    pub provider: Option<Provider>,
    /// Case-insensitive text looked up in the transaction id, meter number,
    /// token and customer name
    pub search: Option<String>,
}

impl HistoryFilter {
    fn matches(&self, stored: &StoredRecord) -> bool {
        let date = stored.record.occurred_at.date_naive();
        self.from.map_or(true, |from| date >= from)
            && self.to.map_or(true, |to| date <= to)
            && self.family.map_or(true, |f| stored.record.family() == f)
            && self
                .provider
                .map_or(true, |p| stored.record.provider() == Some(p))
            && self.matches_search(stored)
    }

    fn matches_search(&self, stored: &StoredRecord) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => needle.to_lowercase(),
            _ => return true,
        };

        let record = &stored.record;
        let token = record.electricity();
        [
            record.transaction_id.as_deref(),
            token.and_then(|t| t.meter_number.as_deref()),
            token.and_then(|t| t.token.as_deref()),
            record.customer_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
    }
}

pub struct HistoryService {
    store: Arc<dyn RecordStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Records matching `filter`, newest first
    ///
    /// The most selective filter goes to the store; the rest are applied here.
    pub fn list(&self, filter: &HistoryFilter) -> Result<Vec<StoredRecord>> {
        let records = match (filter.from, filter.to, filter.provider, filter.family) {
            (Some(from), Some(to), _, _) => self.store.list_records_by_date_range(from, to)?,
            (_, _, Some(provider), _) => self.store.list_records_by_provider(provider)?,
            (_, _, None, Some(family)) => self.store.list_records_by_family(family)?,
            _ => self.store.list_records()?,
        };

        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// Get a record by id
    pub fn get(&self, id: Uuid) -> Result<StoredRecord> {
        self.store
            .get_record(id)?
            .ok_or_else(|| Error::not_found(format!("record {}", id)).into())
    }

    /// Replace a record's notes; `None` or blank text clears them
    pub fn set_notes(&self, id: Uuid, notes: Option<&str>) -> Result<StoredRecord> {
        let mut stored = self.get(id)?;
        stored.notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        if !self.store.update_record(&stored)? {
            return Err(Error::not_found(format!("record {}", id)).into());
        }
        Ok(stored)
    }

    /// Delete a record
    pub fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_record(id)? {
            return Err(Error::not_found(format!("record {}", id)).into());
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self.store.count_records()?)
    }
}
