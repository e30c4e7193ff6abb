//! Prompts sent to the upstream model.

use crate::domain::AnalysisRequest;

/// Fixed system instruction describing the expected response schema.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert code reviewer. Analyze the user's code.
Respond ONLY with valid JSON using exactly this structure:
{
  "bugs": [
    {
      "description": "Clear description of the bug, issue, or logical error.",
      "line": 10,
      "severity": "high|medium|low"
    }
  ],
  "suggestions": ["First improvement suggestion.", "Second improvement suggestion."],
  "explanation": "Short summary of the code's quality, its main issues, and overall advice.",
  "correctedCode": "The code with the most critical bugs fixed. If nothing needs fixing or a fix is not feasible, return the original code or an empty string."
}
"#;

/// Build the per-request prompt embedding the code in a fence tagged with its language.
pub fn build_user_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Analyze the following {language} code for bugs, logical errors, and improvement suggestions. Also provide a corrected version of the code.\n\nCode:\n```{language}\n{code}\n```\n",
        language = request.language,
        code = request.code,
    )
}
