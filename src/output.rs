//! Rendering of run outcomes.

use crate::error::{Result, RunnerError};
use crate::query::RunOutcome;

/// Output format for the result document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON document with metadata and rows.
    #[default]
    Json,
    /// One JSON object per row, newline-delimited.
    Ndjson,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: json or ndjson"
            )),
        }
    }
}

/// Renders an outcome in the given format. The result always ends with a newline.
pub fn render(outcome: &RunOutcome, format: OutputFormat) -> Result<String> {
    let to_internal =
        |e: serde_json::Error| RunnerError::internal(format!("Failed to serialize output: {e}"));

    match format {
        OutputFormat::Json => {
            let mut doc = serde_json::to_string_pretty(outcome).map_err(to_internal)?;
            doc.push('\n');
            Ok(doc)
        }
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for row in &outcome.rows {
                out.push_str(&serde_json::to_string(row).map_err(to_internal)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}
