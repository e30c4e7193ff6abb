#![deny(missing_docs)]
//! BugAI command-line interface.
//!
//! Submits source files to a BugAI server and reads or clears its history.

mod api;

use api::{ApiClient, ClearSummary, DEFAULT_SERVER_URL};
use bugai_core::{
    AnalysisRequest, render_history_markdown, render_history_text, render_json,
    render_result_markdown, render_result_text,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "bugai", version, about = "BugAI CLI")]
struct Cli {
    /// Base URL of the BugAI server.
    #[arg(long, global = true, env = "BUGAI_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,
    #[command(flatten)]
    output: OutputArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the output to a file instead of stdout.
    #[arg(long = "report-output", global = true)]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a source file for bugs.
    Analyze {
        /// Source file to analyze.
        file: PathBuf,
        /// Language name; inferred from the file extension when omitted.
        #[arg(long)]
        language: Option<String>,
        /// Language MIME type; inferred from the file extension when omitted.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Show the most recent analyses.
    History,
    /// Delete every recorded analysis.
    ClearHistory,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server)?;
    run(cli.command, &client, &cli.output).await
}

#[cfg(test)]
fn main() {}

async fn run(command: Commands, client: &ApiClient, output: &OutputArgs) -> CliResult<()> {
    match command {
        Commands::Analyze {
            file,
            language,
            mime,
        } => run_analyze(client, &file, language, mime, output).await,
        Commands::History => {
            let entries = client.history().await?;
            let contents = match output.format {
                OutputFormat::Text => render_history_text(&entries),
                OutputFormat::Markdown => render_history_markdown(&entries),
                OutputFormat::Json => render_json(&entries)?,
            };
            emit_output(output, contents).await
        }
        Commands::ClearHistory => {
            let summary = client.clear_history().await?;
            emit_output(output, render_clear_summary(summary, output.format)?).await
        }
    }
}

async fn run_analyze(
    client: &ApiClient,
    file: &Path,
    language: Option<String>,
    mime: Option<String>,
    output: &OutputArgs,
) -> CliResult<()> {
    let (language, language_mime) = resolve_language(file, language, mime)?;
    let code = tokio::fs::read_to_string(file)
        .await
        .map_err(|err| format!("failed to read {}: {err}", file.display()))?;
    let request = AnalysisRequest {
        code,
        language,
        language_mime,
    };
    let result = client.analyze(&request).await?;
    let contents = match output.format {
        OutputFormat::Text => render_result_text(&result),
        OutputFormat::Markdown => render_result_markdown(&result, &request.language),
        OutputFormat::Json => render_json(&result)?,
    };
    emit_output(output, contents).await
}

/// Language name and MIME type for a file extension.
fn infer_language(path: &Path) -> Option<(&'static str, &'static str)> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let pair = match extension.as_str() {
        "py" => ("python", "text/x-python"),
        "js" | "mjs" | "cjs" | "jsx" => ("javascript", "text/javascript"),
        "ts" | "tsx" => ("typescript", "application/typescript"),
        "rs" => ("rust", "text/x-rustsrc"),
        "go" => ("go", "text/x-go"),
        "java" => ("java", "text/x-java"),
        "kt" | "kts" => ("kotlin", "text/x-kotlin"),
        "c" | "h" => ("c", "text/x-csrc"),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => ("cpp", "text/x-c++src"),
        "cs" => ("csharp", "text/x-csharp"),
        "rb" => ("ruby", "text/x-ruby"),
        "php" => ("php", "application/x-httpd-php"),
        "swift" => ("swift", "text/x-swift"),
        "sh" | "bash" => ("shell", "text/x-sh"),
        "sql" => ("sql", "text/x-sql"),
        "html" | "htm" => ("html", "text/html"),
        "css" => ("css", "text/css"),
        _ => return None,
    };
    Some(pair)
}

fn resolve_language(
    path: &Path,
    language: Option<String>,
    mime: Option<String>,
) -> CliResult<(String, String)> {
    let inferred = infer_language(path);
    let language = language
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| inferred.map(|(language, _)| language.to_string()))
        .ok_or_else(|| {
            format!(
                "cannot infer a language for {}; pass --language",
                path.display()
            )
        })?;
    let mime = mime
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| inferred.map(|(_, mime)| mime.to_string()))
        .unwrap_or_else(|| "text/plain".to_string());
    Ok((language, mime))
}

fn render_clear_summary(summary: ClearSummary, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Text => format!("Deleted {} history entries.\n", summary.deleted_count),
        OutputFormat::Markdown => format!(
            "# BugAI History\n\nDeleted {} history entries.\n",
            summary.deleted_count
        ),
        OutputFormat::Json => render_json(&summary)?,
    })
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}
