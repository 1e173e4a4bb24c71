//! Shared value types for the batch job.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! invariants (column indices are one-based, batch spans tile the row list
//! exactly) and participate in domain computations.

use serde::{Deserialize, Serialize};

use crate::{JobError, SheetName, SpreadsheetId, Violation};

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A one-based spreadsheet column number (`1` is column `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnIndex(u32);

impl ColumnIndex {
    /// Creates a [`ColumnIndex`], returning `None` if `value` is below 1 or
    /// does not fit the column range.
    #[must_use]
    pub fn new(value: i64) -> Option<Self> {
        u32::try_from(value).ok().filter(|v| *v >= 1).map(Self)
    }

    /// Returns the one-based column number.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the A1-notation column letters (`1 → A`, `27 → AA`).
    pub fn letter(self) -> String {
        column_letter(self.0)
    }
}

impl std::fmt::Display for ColumnIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Converts a one-based column number to spreadsheet letters.
///
/// Bijective base-26: each step shifts to zero-based before taking the digit.
/// `0` yields an empty string.
pub fn column_letter(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        index -= 1;
        letters.push(b'A' + (index % 26) as u8);
        index /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Job request
// ---------------------------------------------------------------------------

/// A validated job: which sheet to read, what to ask, where to write.
///
/// Immutable once constructed; built once per invocation by
/// [`JobRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    /// Spreadsheet to read from and write to.
    pub spreadsheet_id: SpreadsheetId,
    /// Tab within the spreadsheet.
    pub sheet_name: SheetName,
    /// Instruction sent ahead of every row's text.
    pub prompt: String,
    /// Column receiving the model responses.
    pub column: ColumnIndex,
}

impl JobRequest {
    /// Validates raw invocation parameters.
    ///
    /// Every violation is collected before failing, so a caller sees all
    /// problems with one invocation at once.
    pub fn validate(
        spreadsheet_id: &str,
        sheet_name: &str,
        prompt: &str,
        column_index: i64,
    ) -> Result<Self, JobError> {
        let mut violations = Vec::new();
        let non_empty = "is required and must be a non-empty string";

        let spreadsheet = SpreadsheetId::new(spreadsheet_id);
        if spreadsheet.is_none() {
            violations.push(Violation {
                field: "spreadsheetId",
                reason: non_empty.into(),
            });
        }
        let sheet = SheetName::new(sheet_name);
        if sheet.is_none() {
            violations.push(Violation {
                field: "sheetName",
                reason: non_empty.into(),
            });
        }
        if prompt.trim().is_empty() {
            violations.push(Violation {
                field: "prompt",
                reason: non_empty.into(),
            });
        }
        let column = ColumnIndex::new(column_index);
        if column.is_none() {
            violations.push(Violation {
                field: "columnIndex",
                reason: format!("must be an integer >= 1 (got {column_index})"),
            });
        }

        match (spreadsheet, sheet, column) {
            (Some(spreadsheet_id), Some(sheet_name), Some(column)) if violations.is_empty() => {
                Ok(Self {
                    spreadsheet_id,
                    sheet_name,
                    prompt: prompt.to_owned(),
                    column,
                })
            }
            _ => Err(JobError::Validation { violations }),
        }
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// The closed set of LLM provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// OpenRouter chat-completions (OpenAI-compatible) API.
    OpenRouter,
    /// Google AI Studio `generateContent` API.
    Gemini,
}

impl ProviderKind {
    /// Human-readable provider name used in logs and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::OpenRouter => "OpenRouter",
            Self::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// One contiguous slice of the filtered row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    /// One-based batch number.
    pub number: usize,
    /// Offset of the first row of the batch within the filtered row list.
    pub offset: usize,
    /// Number of rows in the batch (never zero).
    pub len: usize,
}

impl BatchSpan {
    /// Index range into the row list.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Splits `total` rows into consecutive spans of at most `size` rows.
///
/// A `size` of zero is treated as one.
pub fn batch_spans(total: usize, size: usize) -> Vec<BatchSpan> {
    let size = size.max(1);
    (0..total)
        .step_by(size)
        .enumerate()
        .map(|(i, offset)| BatchSpan {
            number: i + 1,
            offset,
            len: size.min(total - offset),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

const ERROR_PREFIX: &str = "[ERROR: ";

/// Formats the inline placeholder written in place of a failed item.
pub fn error_placeholder(message: &str) -> String {
    format!("{ERROR_PREFIX}{message}]")
}

/// Returns `true` if `value` was produced by [`error_placeholder`].
pub fn is_error_placeholder(value: &str) -> bool {
    value.starts_with(ERROR_PREFIX) && value.ends_with(']')
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Non-blank rows read from the sheet.
    pub rows: usize,
    /// Batches processed.
    pub batches: usize,
    /// Items written as error placeholders.
    pub failed_items: usize,
}
