//! Read → complete → write loop over a whole sheet.
//!
//! Batches run strictly one after another; concurrency exists only inside a
//! batch, in the [`BatchScheduler`]. After each write the orchestrator pauses
//! briefly so spreadsheet writes stay under the Sheets API quota independently
//! of the LLM throttling.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{batch_spans, is_error_placeholder, JobError, JobRequest, JobSummary, SheetStore};
use tracing::{info, warn};

use crate::scheduler::BatchScheduler;

/// Default rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Pause between consecutive batch writes.
pub const WRITE_DELAY: Duration = Duration::from_millis(100);

/// Drives one job from validation to the last write.
pub struct Orchestrator {
    sheets: Arc<dyn SheetStore>,
    scheduler: BatchScheduler,
    batch_size: usize,
}

impl Orchestrator {
    /// Creates an orchestrator with the default batch size.
    pub fn new(sheets: Arc<dyn SheetStore>, scheduler: BatchScheduler) -> Self {
        Self {
            sheets,
            scheduler,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the number of rows per batch (at least one).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Validates raw parameters, then processes the sheet.
    ///
    /// Invalid parameters fail before any spreadsheet or provider call.
    pub async fn process_sheet(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        prompt: &str,
        column_index: i64,
    ) -> Result<JobSummary, JobError> {
        let job = JobRequest::validate(spreadsheet_id, sheet_name, prompt, column_index)?;
        self.run(&job).await
    }

    /// Processes an already validated job.
    pub async fn run(&self, job: &JobRequest) -> Result<JobSummary, JobError> {
        let provider = self.scheduler.provider();
        info!(
            spreadsheet = %job.spreadsheet_id,
            sheet = %job.sheet_name,
            prompt = %job.prompt,
            column = %job.column,
            provider = %provider.kind(),
            model = provider.model(),
            batch_size = self.batch_size,
            concurrency = self.scheduler.concurrency(),
            "starting sheet processing"
        );

        let texts = self
            .sheets
            .read_column(&job.spreadsheet_id, &job.sheet_name)
            .await?;
        info!(rows = texts.len(), "read source rows");
        if texts.is_empty() {
            warn!("no data to process");
            return Ok(JobSummary::default());
        }

        let total = texts.len();
        let spans = batch_spans(total, self.batch_size);
        let mut summary = JobSummary {
            rows: total,
            ..JobSummary::default()
        };
        let mut processed = 0;

        for span in &spans {
            info!(
                batch = span.number,
                batches = spans.len(),
                first_row = span.offset + 1,
                last_row = span.offset + span.len,
                "processing batch"
            );

            let results = self.scheduler.run(&texts[span.range()], &job.prompt).await;
            summary.failed_items += results.iter().filter(|r| is_error_placeholder(r)).count();

            self.sheets
                .write_column(
                    &job.spreadsheet_id,
                    &job.sheet_name,
                    &results,
                    span.offset,
                    job.column,
                )
                .await?;

            processed += span.len;
            summary.batches += 1;
            info!(
                processed,
                total,
                progress = %format!("{:.1}%", processed as f64 * 100.0 / total as f64),
                "batch written"
            );

            if processed < total {
                tokio::time::sleep(WRITE_DELAY).await;
            }
        }

        info!(
            rows = summary.rows,
            batches = summary.batches,
            failed_items = summary.failed_items,
            "processing complete"
        );
        Ok(summary)
    }
}
