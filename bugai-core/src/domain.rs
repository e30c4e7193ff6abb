//! Domain entities for BugAI.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Source code submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Source code to analyze.
    pub code: String,
    /// Language name, also used as the fence tag in the prompt.
    pub language: String,
    /// MIME type the client associates with the language.
    pub language_mime: String,
}

/// Severity levels the model is asked to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Must be fixed.
    High,
    /// Should be fixed.
    Medium,
    /// Minor issue.
    Low,
}

impl Severity {
    /// Human-readable severity label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Parse a severity label, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// A single finding reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Bug {
    /// Description of the bug or logical error.
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    /// Line number the finding refers to, if the model gave a usable one.
    #[serde(default, deserialize_with = "lenient_line")]
    pub line: Option<i64>,
    /// Severity exactly as the model wrote it; non-string scalars keep their JSON text.
    #[serde(default, deserialize_with = "lenient_text")]
    pub severity: String,
}

impl Bug {
    /// Interpret the verbatim severity, if it is one of the known levels.
    pub fn severity_level(&self) -> Option<Severity> {
        Severity::parse(&self.severity)
    }
}

/// Structured analysis recovered from the model response.
///
/// Every field falls back to an empty value when the model omits it or
/// sends `null`. Top-level keys outside the schema are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Bugs in the order the model listed them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub bugs: Vec<Bug>,
    /// Improvement suggestions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    /// Summary of code quality and main issues.
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    /// Corrected version of the code, possibly empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub corrected_code: String,
    /// Additional top-level keys the model sent, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full analysis payload kept with a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Structured analysis returned to the client.
    #[serde(flatten)]
    pub result: AnalysisResult,
    /// Submitted source code.
    pub code: String,
    /// Submitted language.
    pub language: String,
    /// Submitted language MIME type.
    pub language_mime: String,
    /// Timestamp of the analysis.
    pub timestamp: String,
}

/// Summarized record of a past analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique key derived from the timestamp.
    pub id: String,
    /// Submitted language.
    pub language: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Explanation truncated for listing.
    #[serde(rename = "explanation")]
    pub explanation_summary: String,
    /// Number of bugs found.
    pub bug_count: usize,
    /// Full analysis payload.
    pub full_data: AnalysisRecord,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_line<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|line| line as i64)),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}
