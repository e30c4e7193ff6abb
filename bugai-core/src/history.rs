//! Analysis history entries and storage contract.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::domain::{AnalysisRecord, AnalysisRequest, AnalysisResult, HistoryEntry};
use crate::error::StoreError;

/// Maximum number of entries returned by a history listing.
pub const HISTORY_LIMIT: usize = 20;

/// Number of explanation characters kept in a history summary.
pub const SUMMARY_CHARS: usize = 75;

/// Explanation shown when the model did not provide one.
pub const NO_EXPLANATION: &str = "No explanation.";

const SUMMARY_SUFFIX: &str = "...";
/// Request fields merged into [`AnalysisRecord`]; model keys with these names are dropped.
const RECORD_KEYS: [&str; 4] = ["code", "language", "languageMime", "timestamp"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Persistent log of past analyses.
#[cfg_attr(test, mockall::automock)]
pub trait HistoryStore {
    /// Append an entry.
    fn insert(&self, entry: &HistoryEntry) -> Result<(), StoreError>;
    /// Entries sorted by timestamp, newest first, at most `limit` of them.
    fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;
    /// Delete every entry, returning how many were removed.
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Format a timestamp as fixed-width ISO-8601 with microseconds.
///
/// Fixed width keeps lexical order equal to chronological order.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// First [`SUMMARY_CHARS`] characters of the explanation followed by `...`.
///
/// The suffix is appended even when nothing was cut.
pub fn summarize_explanation(explanation: &str) -> String {
    let mut summary: String = explanation.chars().take(SUMMARY_CHARS).collect();
    summary.push_str(SUMMARY_SUFFIX);
    summary
}

/// Build the history entry recorded for a successful analysis.
///
/// An empty explanation is summarized as [`NO_EXPLANATION`].
pub fn build_history_entry(
    request: &AnalysisRequest,
    result: &AnalysisResult,
    at: NaiveDateTime,
) -> HistoryEntry {
    let timestamp = format_timestamp(at);
    let explanation = if result.explanation.is_empty() {
        NO_EXPLANATION
    } else {
        result.explanation.as_str()
    };
    let mut stored = result.clone();
    stored.extra.retain(|key, _| !RECORD_KEYS.contains(&key.as_str()));
    HistoryEntry {
        id: timestamp.clone(),
        language: request.language.clone(),
        timestamp: timestamp.clone(),
        explanation_summary: summarize_explanation(explanation),
        bug_count: result.bugs.len(),
        full_data: AnalysisRecord {
            result: stored,
            code: request.code.clone(),
            language: request.language.clone(),
            language_mime: request.language_mime.clone(),
            timestamp,
        },
    }
}

/// In-process history store.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl MemoryHistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<HistoryEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::new("history lock poisoned"))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn insert(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.lock()?.push(entry.clone());
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.lock()?.clone();
        // Equal timestamps list the later insert first.
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut entries = self.lock()?;
        let deleted = entries.len();
        entries.clear();
        Ok(deleted)
    }
}
