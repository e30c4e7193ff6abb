//! Recovery of the structured analysis embedded in free-form model output.
//!
//! The model is asked for bare JSON but routinely wraps it in Markdown fences,
//! surrounds it with prose, or mixes in fenced source code. Extraction runs an
//! ordered chain of [`Strategy`] values over the raw text:
//!
//! 1. [`Strategy::JsonFence`]: the body of the first fence tagged `json`.
//! 2. [`Strategy::AnyFence`]: the body of the first fence of any kind.
//! 3. [`Strategy::WholeText`]: the raw text itself.
//!
//! The first strategy that applies yields the candidate. If the candidate does
//! not start with `{`, [`Strategy::BraceScan`] takes the span from the first
//! `{` to the last `}` of the raw text instead.

use crate::domain::AnalysisResult;
use crate::error::ExtractionError;

const FENCE: &str = "```";
const CLOSING_FENCE: &str = "\n```";
const JSON_TAG: &str = "json";

/// A single way of locating the JSON candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Body of the first fence whose language tag is `json`.
    JsonFence,
    /// Body of the first fence, whatever its tag.
    AnyFence,
    /// The whole raw text.
    WholeText,
    /// From the first `{` to the last `}` of the raw text.
    BraceScan,
}

/// Outcome of running one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<'a> {
    /// The strategy applied and produced this candidate text.
    Found(&'a str),
    /// The strategy does not apply to this text.
    Skipped,
}

impl Strategy {
    /// Strategies tried in order to pick the initial candidate.
    pub const CHAIN: [Strategy; 3] = [Strategy::JsonFence, Strategy::AnyFence, Strategy::WholeText];

    /// Stable strategy label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::JsonFence => "json_fence",
            Strategy::AnyFence => "any_fence",
            Strategy::WholeText => "whole_text",
            Strategy::BraceScan => "brace_scan",
        }
    }

    /// Run this strategy against the raw model text.
    pub fn attempt(self, raw: &str) -> Attempt<'_> {
        match self {
            Strategy::JsonFence => json_fence(raw),
            Strategy::AnyFence => any_fence(raw),
            Strategy::WholeText => Attempt::Found(raw),
            Strategy::BraceScan => brace_scan(raw),
        }
    }
}

/// A successfully extracted analysis and the strategy that located it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Strategy whose candidate parsed.
    pub strategy: Strategy,
    /// Normalized analysis.
    pub result: AnalysisResult,
}

/// Extract the structured analysis from raw model output.
pub fn extract(raw: &str) -> Result<AnalysisResult, ExtractionError> {
    extract_with_strategy(raw).map(|extraction| extraction.result)
}

/// Extract the structured analysis and report which strategy located it.
pub fn extract_with_strategy(raw: &str) -> Result<Extraction, ExtractionError> {
    let (strategy, candidate) = Strategy::CHAIN
        .iter()
        .find_map(|strategy| match strategy.attempt(raw) {
            Attempt::Found(candidate) => Some((*strategy, candidate)),
            Attempt::Skipped => None,
        })
        .unwrap_or((Strategy::WholeText, raw));

    let (strategy, candidate) = if candidate.trim().starts_with('{') {
        (strategy, candidate)
    } else {
        match Strategy::BraceScan.attempt(raw) {
            Attempt::Found(span) => (Strategy::BraceScan, span),
            Attempt::Skipped => return Err(ExtractionError::NoJsonFound),
        }
    };

    let result = serde_json::from_str::<AnalysisResult>(candidate.trim()).map_err(|err| {
        ExtractionError::MalformedJson {
            message: err.to_string(),
            raw: raw.to_string(),
        }
    })?;
    Ok(Extraction { strategy, result })
}

fn json_fence(raw: &str) -> Attempt<'_> {
    raw.match_indices(FENCE)
        .map(|(open, _)| open_fence(raw, open))
        .find(|(info, _)| info.trim() == JSON_TAG)
        .map_or(Attempt::Skipped, |(_, body_start)| {
            Attempt::Found(fence_body(raw, body_start))
        })
}

fn any_fence(raw: &str) -> Attempt<'_> {
    raw.find(FENCE).map_or(Attempt::Skipped, |open| {
        let (_, body_start) = open_fence(raw, open);
        Attempt::Found(fence_body(raw, body_start))
    })
}

fn brace_scan(raw: &str) -> Attempt<'_> {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => Attempt::Found(&raw[start..=end]),
        _ => Attempt::Skipped,
    }
}

/// Split an opening fence into its info string and the offset where its body starts.
fn open_fence(raw: &str, open: usize) -> (&str, usize) {
    let info_start = open + FENCE.len();
    let rest = &raw[info_start..];
    match rest.find('\n') {
        Some(newline) => (&rest[..newline], info_start + newline + 1),
        None => (rest, raw.len()),
    }
}

/// Body text from `body_start` up to the next fence that opens a line.
fn fence_body(raw: &str, body_start: usize) -> &str {
    let body = &raw[body_start..];
    if body.starts_with(FENCE) {
        return "";
    }
    match body.find(CLOSING_FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}
