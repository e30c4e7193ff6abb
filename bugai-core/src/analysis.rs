//! Analysis orchestration: prompt, model call, extraction, history.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};

use crate::domain::{AnalysisRequest, AnalysisResult, HistoryEntry};
use crate::error::{AnalysisError, ExtractionError};
use crate::extract::extract_with_strategy;
use crate::history::{HistoryStore, build_history_entry};
use crate::model::ModelClient;
use crate::prompt::{SYSTEM_INSTRUCTION, build_user_prompt};

/// Shared model client handle.
pub type SharedModelClient = Arc<dyn ModelClient + Send + Sync>;
/// Shared history store handle.
pub type SharedHistoryStore = Arc<dyn HistoryStore + Send + Sync>;

/// Runs code analyses and owns access to the history log.
#[derive(Clone)]
pub struct AnalysisService {
    model: SharedModelClient,
    history: SharedHistoryStore,
}

impl AnalysisService {
    /// Build a service from explicit model and store handles.
    pub fn new(model: SharedModelClient, history: SharedHistoryStore) -> Self {
        Self { model, history }
    }

    /// Analyze code, record a history entry, and return the structured result.
    ///
    /// The entry is stamped once the model response has been extracted.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_clock(request, || Utc::now().naive_utc())
    }

    /// Analyze code, stamping the history entry with `at`.
    ///
    /// Nothing is written to history unless the model call and extraction succeed.
    pub fn analyze_at(
        &self,
        request: &AnalysisRequest,
        at: NaiveDateTime,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_clock(request, move || at)
    }

    fn analyze_with_clock<F>(
        &self,
        request: &AnalysisRequest,
        clock: F,
    ) -> Result<AnalysisResult, AnalysisError>
    where
        F: FnOnce() -> NaiveDateTime,
    {
        let prompt = build_user_prompt(request);
        let raw = self
            .model
            .generate(SYSTEM_INSTRUCTION, &prompt)
            .inspect_err(|err| log::warn!("upstream model call failed: {err}"))?;

        let extraction = extract_with_strategy(&raw).inspect_err(|err| match err {
            ExtractionError::NoJsonFound => {
                log::error!("no JSON found in model response; raw response was: {raw}")
            }
            ExtractionError::MalformedJson { message, .. } => {
                log::error!("failed to parse model response ({message}); raw response was: {raw}")
            }
        })?;

        let entry = build_history_entry(request, &extraction.result, clock());
        self.history
            .insert(&entry)
            .inspect_err(|err| log::error!("failed to record history entry {}: {err}", entry.id))?;

        log::info!(
            "analyzed {} code: {} bugs (extracted via {})",
            request.language,
            entry.bug_count,
            extraction.strategy.as_str()
        );
        Ok(extraction.result)
    }

    /// Most recent history entries, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>, AnalysisError> {
        Ok(self.history.list(limit)?)
    }

    /// Delete all history, returning the number of removed entries.
    pub fn clear_history(&self) -> Result<usize, AnalysisError> {
        let deleted = self.history.clear()?;
        log::info!("cleared {deleted} history entries");
        Ok(deleted)
    }
}
