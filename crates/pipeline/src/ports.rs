//! Port traits implemented by the infrastructure crates.
//!
//! The orchestration layer depends only on these traits. `llm` supplies a
//! [`CompletionProvider`], `sheets` supplies a [`SheetStore`], and tests
//! supply in-memory fakes.

use async_trait::async_trait;

use crate::{ColumnIndex, ProviderError, ProviderKind, SheetError, SheetName, SpreadsheetId};

/// Issues one completion request to an LLM provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Which provider family answers the requests.
    fn kind(&self) -> ProviderKind;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Sends `prompt` followed by `text` and returns the response text.
    ///
    /// Implementations own their retry policy; an `Err` is final.
    async fn complete(&self, text: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Reads source texts from, and writes results to, one spreadsheet column.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Returns column `A` from row 2 down, trimmed, with blank rows dropped.
    async fn read_column(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &SheetName,
    ) -> Result<Vec<String>, SheetError>;

    /// Writes `values` into `column`, one per row, starting at sheet row
    /// `start_offset + 2`.
    async fn write_column(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &SheetName,
        values: &[String],
        start_offset: usize,
        column: ColumnIndex,
    ) -> Result<(), SheetError>;
}
