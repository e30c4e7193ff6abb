//! Database models for BugAI server.

use bugai_core::{HistoryEntry, StoreError};
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::history;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = history)]
/// History database record.
pub struct HistoryRecord {
    /// Surrogate row key; entry ids may repeat.
    pub row_id: i32,
    /// Entry identifier (the analysis timestamp).
    pub id: String,
    /// Submitted language.
    pub language: String,
    /// ISO-8601 analysis timestamp.
    pub timestamp: String,
    /// Truncated explanation.
    pub explanation: String,
    /// Number of bugs found.
    pub bug_count: i32,
    /// JSON-encoded full analysis payload.
    pub full_data: String,
    /// Row creation timestamp.
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = history)]
/// New history record for insert.
pub struct NewHistoryRecord {
    /// Entry identifier (the analysis timestamp).
    pub id: String,
    /// Submitted language.
    pub language: String,
    /// ISO-8601 analysis timestamp.
    pub timestamp: String,
    /// Truncated explanation.
    pub explanation: String,
    /// Number of bugs found.
    pub bug_count: i32,
    /// JSON-encoded full analysis payload.
    pub full_data: String,
    /// Row creation timestamp.
    pub created_at: NaiveDateTime,
}

impl NewHistoryRecord {
    /// Build a record from a history entry.
    pub fn from_entry(entry: &HistoryEntry, created_at: NaiveDateTime) -> Result<Self, StoreError> {
        let full_data = serde_json::to_string(&entry.full_data)
            .map_err(|err| StoreError::new(format!("encode history payload: {err}")))?;
        let bug_count = i32::try_from(entry.bug_count)
            .map_err(|_| StoreError::new(format!("bug count too large: {}", entry.bug_count)))?;
        Ok(Self {
            id: entry.id.clone(),
            language: entry.language.clone(),
            timestamp: entry.timestamp.clone(),
            explanation: entry.explanation_summary.clone(),
            bug_count,
            full_data,
            created_at,
        })
    }
}

impl HistoryRecord {
    /// Convert the record back into a history entry.
    pub fn into_entry(self) -> Result<HistoryEntry, StoreError> {
        let full_data = serde_json::from_str(&self.full_data).map_err(|err| {
            StoreError::new(format!("decode history payload {}: {err}", self.id))
        })?;
        let bug_count = usize::try_from(self.bug_count)
            .map_err(|_| StoreError::new(format!("negative bug count for {}", self.id)))?;
        Ok(HistoryEntry {
            id: self.id,
            language: self.language,
            timestamp: self.timestamp,
            explanation_summary: self.explanation,
            bug_count,
            full_data,
        })
    }
}
