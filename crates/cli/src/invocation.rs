//! Job parameters from a trigger event payload or positional arguments.
//!
//! A `repository_dispatch` event carries the parameters in `client_payload`;
//! a `workflow_dispatch` event carries them in `inputs`, where every value is
//! a string. Four non-blank positional arguments override either.

use std::path::Path;

use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Event name of a manually triggered workflow run.
pub const MANUAL_TRIGGER: &str = "workflow_dispatch";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "sheetllm",
    version,
    about = "Send each row of a Google Sheet to an LLM and write the answers back",
    after_help = "Example:\n  sheetllm 1abc123... Sheet1 \"Name the brand\" 2\n\n\
                  Without arguments the parameters are read from the event file at GITHUB_EVENT_PATH."
)]
pub struct Cli {
    /// Spreadsheet ID (from the sheet URL).
    pub spreadsheet_id: Option<String>,
    /// Sheet (tab) name.
    pub sheet_name: Option<String>,
    /// Instruction sent ahead of every row.
    pub prompt: Option<String>,
    /// One-based column receiving the answers.
    pub column_index: Option<String>,
}

impl Cli {
    /// The positional parameters, when all four are present and non-blank.
    pub fn payload(&self) -> Option<Payload> {
        let all = [
            &self.spreadsheet_id,
            &self.sheet_name,
            &self.prompt,
            &self.column_index,
        ];
        if !all.iter().all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty())) {
            return None;
        }
        Some(Payload {
            spreadsheet_id: self.spreadsheet_id.clone(),
            sheet_name: self.sheet_name.clone(),
            prompt: self.prompt.clone(),
            column_index: self.column_index.as_deref().and_then(parse_column),
        })
    }
}

/// Possibly incomplete job parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payload {
    /// Spreadsheet ID.
    pub spreadsheet_id: Option<String>,
    /// Sheet name.
    pub sheet_name: Option<String>,
    /// Prompt.
    pub prompt: Option<String>,
    /// Column index; `None` when absent or not a number.
    #[serde(deserialize_with = "column_from_json")]
    pub column_index: Option<i64>,
}

/// Complete job parameters, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    /// Spreadsheet ID.
    pub spreadsheet_id: String,
    /// Sheet name.
    pub sheet_name: String,
    /// Prompt.
    pub prompt: String,
    /// Column index.
    pub column_index: i64,
}

/// What the process should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Process the sheet.
    Run(JobParams),
    /// Manual trigger without parameters: exit successfully.
    Noop {
        /// Parameters that were absent.
        missing: Vec<&'static str>,
    },
    /// Parameters are missing: exit with failure.
    Missing(Vec<&'static str>),
}

/// Failure to load the trigger event file.
#[derive(Debug, Error)]
pub enum EventError {
    /// The file could not be read.
    #[error("failed to read event file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid event JSON.
    #[error("failed to parse event file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct EventFile {
    client_payload: Option<Payload>,
    inputs: Option<Payload>,
}

fn parse_column(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// `workflow_dispatch` inputs are strings, `repository_dispatch` payloads may
/// carry a number; anything else counts as absent.
fn column_from_json<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => parse_column(&s),
        _ => None,
    })
}

/// Parses an event JSON document: `client_payload`, else `inputs`, else empty.
pub fn payload_from_event(json: &str) -> Result<Payload, serde_json::Error> {
    let event: EventFile = serde_json::from_str(json)?;
    Ok(event.client_payload.or(event.inputs).unwrap_or_default())
}

/// Reads and parses the event file at `path`.
pub fn read_event_file(path: &Path) -> Result<Payload, EventError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(payload_from_event(&raw)?)
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decides what to do with the collected parameters.
pub fn resolve(payload: Payload, event_name: Option<&str>) -> Invocation {
    let spreadsheet_id = filled(payload.spreadsheet_id);
    let sheet_name = filled(payload.sheet_name);
    let prompt = filled(payload.prompt);

    let mut missing = Vec::new();
    if spreadsheet_id.is_none() {
        missing.push("spreadsheetId");
    }
    if sheet_name.is_none() {
        missing.push("sheetName");
    }
    if prompt.is_none() {
        missing.push("prompt");
    }
    if payload.column_index.is_none() {
        missing.push("columnIndex");
    }

    match (spreadsheet_id, sheet_name, prompt, payload.column_index) {
        (Some(spreadsheet_id), Some(sheet_name), Some(prompt), Some(column_index)) => {
            Invocation::Run(JobParams {
                spreadsheet_id,
                sheet_name,
                prompt,
                column_index,
            })
        }
        _ if event_name.map(str::trim) == Some(MANUAL_TRIGGER) => Invocation::Noop { missing },
        _ => Invocation::Missing(missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_dispatch_payload() {
        let payload = payload_from_event(
            r#"{"action":"process","client_payload":{
                "spreadsheetId":"1abc","sheetName":"News","prompt":"Brand?","columnIndex":3}}"#,
        )
        .unwrap();
        assert_eq!(payload.spreadsheet_id.as_deref(), Some("1abc"));
        assert_eq!(payload.column_index, Some(3));
    }

    #[test]
    fn workflow_dispatch_inputs_are_strings() {
        let payload = payload_from_event(
            r#"{"inputs":{"spreadsheetId":"1abc","sheetName":"News","prompt":"Brand?","columnIndex":"2"}}"#,
        )
        .unwrap();
        assert_eq!(payload.column_index, Some(2));
    }

    #[test]
    fn unusable_column_counts_as_absent() {
        let payload = payload_from_event(
            r#"{"client_payload":{"spreadsheetId":"1abc","columnIndex":true}}"#,
        )
        .unwrap();
        assert_eq!(payload.column_index, None);
        assert_eq!(payload.sheet_name, None);
    }

    #[test]
    fn push_event_has_no_payload() {
        let payload = payload_from_event(r#"{"ref":"refs/heads/main"}"#).unwrap();
        assert_eq!(payload, Payload::default());
    }

    #[test]
    fn complete_payload_runs() {
        let payload = Payload {
            spreadsheet_id: Some("id".into()),
            sheet_name: Some("Sheet1".into()),
            prompt: Some("p".into()),
            column_index: Some(0),
        };
        match resolve(payload, None) {
            Invocation::Run(params) => assert_eq!(params.column_index, 0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_listed() {
        let payload = Payload {
            spreadsheet_id: Some("id".into()),
            sheet_name: Some("  ".into()),
            ..Payload::default()
        };
        assert_eq!(
            resolve(payload, Some("repository_dispatch")),
            Invocation::Missing(vec!["sheetName", "prompt", "columnIndex"])
        );
    }

    #[test]
    fn manual_trigger_without_inputs_is_a_noop() {
        assert!(matches!(
            resolve(Payload::default(), Some("workflow_dispatch")),
            Invocation::Noop { .. }
        ));
    }

    #[test]
    fn positional_arguments_need_all_four() {
        let cli = Cli::parse_from(["sheetllm", "id", "Sheet1", "Brand?", "4"]);
        assert_eq!(cli.payload().unwrap().column_index, Some(4));

        let partial = Cli::parse_from(["sheetllm", "id", "Sheet1"]);
        assert!(partial.payload().is_none());

        let blank = Cli::parse_from(["sheetllm", "id", "Sheet1", " ", "4"]);
        assert!(blank.payload().is_none());
    }

    #[test]
    fn non_numeric_column_counts_as_missing() {
        let cli = Cli::parse_from(["sheetllm", "id", "Sheet1", "Brand?", "B"]);
        let payload = cli.payload().unwrap();
        assert_eq!(
            resolve(payload, None),
            Invocation::Missing(vec!["columnIndex"])
        );
    }
}
