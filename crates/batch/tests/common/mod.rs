//! In-memory fakes for the provider and sheet ports.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    ColumnIndex, CompletionProvider, ProviderError, ProviderKind, SheetError, SheetName,
    SheetStore, SpreadsheetId,
};
use tokio::time::Instant;

/// Answers `"<prompt> => <text>"`, failing for texts listed in `fail_on`.
#[derive(Default)]
pub struct EchoProvider {
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Vec<String>,
    pub latency: Duration,
}

impl EchoProvider {
    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            fail_on: texts.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn model(&self) -> &str {
        "echo"
    }

    async fn complete(&self, text: &str, prompt: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(text.to_owned());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_on.iter().any(|t| t == text) {
            return Err(ProviderError::Api {
                provider: "OpenRouter".into(),
                status: 400,
                body: "bad input".into(),
            });
        }
        Ok(format!("{prompt} => {text}"))
    }
}

/// One recorded `write_column` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub values: Vec<String>,
    pub start_offset: usize,
    pub column: ColumnIndex,
    pub at: Instant,
}

/// Serves fixed rows and records writes.
#[derive(Default)]
pub struct MemorySheet {
    pub rows: Vec<String>,
    pub reads: AtomicUsize,
    pub writes: Mutex<Vec<Write>>,
    pub fail_read: bool,
    pub fail_write: bool,
}

impl MemorySheet {
    pub fn with_rows(rows: &[&str]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn read_column(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &SheetName,
    ) -> Result<Vec<String>, SheetError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_read {
            return Err(SheetError::Read {
                message: "403 - caller does not have permission".into(),
            });
        }
        Ok(self.rows.clone())
    }

    async fn write_column(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &SheetName,
        values: &[String],
        start_offset: usize,
        column: ColumnIndex,
    ) -> Result<(), SheetError> {
        if self.fail_write {
            return Err(SheetError::Write {
                range: "Sheet1!B2:B3".into(),
                message: "quota exceeded".into(),
            });
        }
        self.writes.lock().unwrap().push(Write {
            values: values.to_vec(),
            start_offset,
            column,
            at: Instant::now(),
        });
        Ok(())
    }
}

pub fn texts(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("text {i}")).collect()
}
