#![deny(missing_docs)]
//! BugAI core library.
//!
//! Domain types, model-response extraction, and analysis orchestration for
//! the BugAI code review relay. I/O lives behind the [`ModelClient`] and
//! [`HistoryStore`] traits so the server can plug in real implementations.

pub mod analysis;
pub mod domain;
pub mod error;
pub mod extract;
pub mod history;
pub mod model;
pub mod prompt;
pub mod report;

pub use analysis::{AnalysisService, SharedHistoryStore, SharedModelClient};
pub use domain::{AnalysisRecord, AnalysisRequest, AnalysisResult, Bug, HistoryEntry, Severity};
pub use error::{AnalysisError, EXTRACTION_DETAIL, ExtractionError, StoreError, UpstreamError};
pub use extract::{Attempt, Extraction, Strategy, extract, extract_with_strategy};
pub use history::{
    HISTORY_LIMIT, HistoryStore, MemoryHistoryStore, NO_EXPLANATION, SUMMARY_CHARS,
    build_history_entry, format_timestamp, summarize_explanation,
};
pub use model::ModelClient;
pub use prompt::{SYSTEM_INSTRUCTION, build_user_prompt};
pub use report::{
    render_history_markdown, render_history_text, render_json, render_result_markdown,
    render_result_text,
};
