//! Report formatting utilities for BugAI outputs.

use std::fmt::Write;

use serde::Serialize;

use crate::domain::{AnalysisResult, Bug, HistoryEntry};
use crate::history::NO_EXPLANATION;

/// Render an analysis result as plain text.
pub fn render_result_text(result: &AnalysisResult) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Explanation:");
    let _ = writeln!(output, "  {}", fallback(&result.explanation, NO_EXPLANATION));
    let _ = writeln!(output);
    let _ = writeln!(output, "Bugs ({}):", result.bugs.len());
    if result.bugs.is_empty() {
        let _ = writeln!(output, "  No bugs found.");
    }
    for bug in &result.bugs {
        let _ = writeln!(
            output,
            "  [{}] {}: {}",
            severity_label(bug),
            line_label(bug),
            bug.description
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Suggestions:");
    if result.suggestions.is_empty() {
        let _ = writeln!(output, "  No suggestions.");
    }
    for suggestion in &result.suggestions {
        let _ = writeln!(output, "  - {suggestion}");
    }
    if !result.corrected_code.trim().is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Corrected code:");
        for line in result.corrected_code.lines() {
            let _ = writeln!(output, "  {line}");
        }
    }
    output
}

/// Render an analysis result as Markdown, fencing corrected code with `language`.
pub fn render_result_markdown(result: &AnalysisResult, language: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# BugAI Analysis\n");
    let _ = writeln!(output, "## Explanation\n");
    let _ = writeln!(output, "{}\n", fallback(&result.explanation, NO_EXPLANATION));
    let _ = writeln!(output, "## Bugs\n");
    if result.bugs.is_empty() {
        let _ = writeln!(output, "No bugs found.\n");
    } else {
        let _ = writeln!(output, "| Severity | Line | Description |");
        let _ = writeln!(output, "| --- | --- | --- |");
        for bug in &result.bugs {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                severity_label(bug),
                bug.line.map_or_else(|| "-".to_string(), |line| line.to_string()),
                escape_cell(&bug.description)
            );
        }
        let _ = writeln!(output);
    }
    let _ = writeln!(output, "## Suggestions\n");
    if result.suggestions.is_empty() {
        let _ = writeln!(output, "No suggestions.\n");
    } else {
        for suggestion in &result.suggestions {
            let _ = writeln!(output, "- {suggestion}");
        }
        let _ = writeln!(output);
    }
    if !result.corrected_code.trim().is_empty() {
        let _ = writeln!(output, "## Corrected code\n");
        let _ = writeln!(output, "```{language}");
        let _ = writeln!(output, "{}", result.corrected_code.trim_end());
        let _ = writeln!(output, "```");
    }
    output
}

/// Render history entries as plain text, one line per entry.
pub fn render_history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No analyses recorded.\n".to_string();
    }
    let mut output = String::new();
    for entry in entries {
        let _ = writeln!(
            output,
            "{}  {:<12} {:>3} bugs  {}",
            entry.timestamp, entry.language, entry.bug_count, entry.explanation_summary
        );
    }
    output
}

/// Render history entries as a Markdown table.
pub fn render_history_markdown(entries: &[HistoryEntry]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# BugAI History\n");
    if entries.is_empty() {
        let _ = writeln!(output, "No analyses recorded.");
        return output;
    }
    let _ = writeln!(output, "| Timestamp | Language | Bugs | Summary |");
    let _ = writeln!(output, "| --- | --- | --- | --- |");
    for entry in entries {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} |",
            entry.timestamp,
            entry.language,
            entry.bug_count,
            escape_cell(&entry.explanation_summary)
        );
    }
    output
}

/// Render any serializable value as pretty JSON with a trailing newline.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn severity_label(bug: &Bug) -> String {
    match bug.severity_level() {
        Some(level) => level.as_str().to_uppercase(),
        None if bug.severity.trim().is_empty() => "UNRATED".to_string(),
        None => bug.severity.trim().to_string(),
    }
}

fn line_label(bug: &Bug) -> String {
    bug.line
        .map_or_else(|| "line ?".to_string(), |line| format!("line {line}"))
}

fn fallback<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
