//! Error types for BugAI core.

use std::{error::Error, fmt};

/// Failure to recover a structured analysis from model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Neither a fenced object nor a brace-delimited span was present.
    NoJsonFound,
    /// A candidate was found but did not parse.
    MalformedJson {
        /// Parser error message.
        message: String,
        /// Raw model text, kept for diagnostics only.
        raw: String,
    },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoJsonFound => write!(f, "no JSON object found in model response"),
            Self::MalformedJson { message, .. } => {
                write!(f, "malformed JSON in model response: {message}")
            }
        }
    }
}

impl Error for ExtractionError {}

/// Failure talking to the upstream model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The model API answered with a non-success status.
    Http {
        /// Upstream status code.
        status: u16,
        /// Upstream response body.
        body: String,
    },
    /// The model API answered 200 without the expected fields.
    Protocol(String),
    /// The request never completed (timeout, connection failure).
    Transport(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, body } => write!(f, "upstream http error ({status}): {body}"),
            Self::Protocol(message) => write!(f, "upstream protocol error: {message}"),
            Self::Transport(message) => write!(f, "upstream transport error: {message}"),
        }
    }
}

impl Error for UpstreamError {}

/// Failure in the history store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Build a store error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for StoreError {}

/// Message shown to clients when the model output cannot be parsed.
pub const EXTRACTION_DETAIL: &str = "Failed to parse response from AI. Retrying may help.";

/// Any failure of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Upstream model failure.
    Upstream(UpstreamError),
    /// Model output could not be parsed.
    Extraction(ExtractionError),
    /// History could not be written or read.
    Store(StoreError),
}

impl AnalysisError {
    /// HTTP status to report: the upstream status for upstream HTTP errors, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Upstream(UpstreamError::Http { status, .. }) => *status,
            _ => 500,
        }
    }

    /// Client-facing detail message. Never includes the raw model text.
    pub fn detail(&self) -> String {
        match self {
            Self::Upstream(UpstreamError::Http { body, .. }) => {
                format!("Upstream model error: {body}")
            }
            Self::Upstream(UpstreamError::Protocol(_)) => {
                "Invalid response structure from the upstream model.".to_string()
            }
            Self::Upstream(UpstreamError::Transport(message)) => {
                format!("Upstream model request failed: {message}")
            }
            Self::Extraction(_) => EXTRACTION_DETAIL.to_string(),
            Self::Store(err) => format!("History store failure: {err}"),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream(err) => write!(f, "{err}"),
            Self::Extraction(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "history store error: {err}"),
        }
    }
}

impl Error for AnalysisError {}

impl From<UpstreamError> for AnalysisError {
    fn from(value: UpstreamError) -> Self {
        Self::Upstream(value)
    }
}

impl From<ExtractionError> for AnalysisError {
    fn from(value: ExtractionError) -> Self {
        Self::Extraction(value)
    }
}

impl From<StoreError> for AnalysisError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
