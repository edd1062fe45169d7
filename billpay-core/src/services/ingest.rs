//! Ingest service - parse messages and store the recognized ones

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Record;
use crate::parser;
use crate::ports::RecordStore;

/// Outcome of ingesting a single message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Saved { id: Uuid, record: Record },
    Unrecognized,
}

/// One recognized message in a batch
#[derive(Debug, Clone, Serialize)]
pub struct IngestedRecord {
    /// Storage id; absent in preview mode
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub record: Record,
}

/// Result of ingesting a batch of messages
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    /// Non-blank messages seen
    pub discovered: i64,
    /// Messages stored (or that would be stored, in preview mode)
    pub imported: i64,
    /// Messages no family recognized
    pub skipped: i64,
    /// Whether this was a preview (nothing stored)
    pub preview: bool,
    pub records: Vec<IngestedRecord>,
}

pub struct IngestService {
    store: Arc<dyn RecordStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Parse without storing
    pub fn preview(&self, text: &str) -> Option<Record> {
        parser::parse(text)
    }

    /// Parse and store one message
    pub fn ingest(&self, text: &str) -> Result<IngestOutcome> {
        let Some(record) = parser::parse(text) else {
            return Ok(IngestOutcome::Unrecognized);
        };
        let id = self
            .store
            .add_record(&record)
            .context("Failed to save record")?;
        Ok(IngestOutcome::Saved { id, record })
    }

    /// Parse and (unless `preview_only`) store a batch of messages
    ///
    /// Blank messages are ignored entirely; unrecognized ones are counted as
    /// skipped. Recognized messages are stored together: if any of them
    /// fails to save, none of the batch is kept.
    pub fn ingest_batch<S: AsRef<str>>(
        &self,
        messages: &[S],
        preview_only: bool,
    ) -> Result<IngestResult> {
        let mut discovered = 0;
        let mut skipped = 0;
        let mut parsed = Vec::new();

        for text in messages.iter().map(AsRef::as_ref) {
            if text.trim().is_empty() {
                continue;
            }
            discovered += 1;

            match parser::parse(text) {
                Some(record) => parsed.push(record),
                None => skipped += 1,
            }
        }

        let ids: Vec<Option<Uuid>> = if preview_only || parsed.is_empty() {
            vec![None; parsed.len()]
        } else {
            self.store
                .add_records(&parsed)
                .with_context(|| {
                    format!("Failed to save batch of {} records; nothing was saved", parsed.len())
                })?
                .into_iter()
                .map(Some)
                .collect()
        };

        let records: Vec<IngestedRecord> = ids
            .into_iter()
            .zip(parsed)
            .map(|(id, record)| IngestedRecord { id, record })
            .collect();

        Ok(IngestResult {
            discovered,
            imported: records.len() as i64,
            skipped,
            preview: preview_only,
            records,
        })
    }
}

/// Split file contents into messages separated by blank lines
///
/// Lines within a message keep their line breaks.
pub fn split_messages(content: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                messages.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        messages.push(current.join("\n"));
    }

    messages
}
