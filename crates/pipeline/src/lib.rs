//! Core domain for the sheet/LLM batch job.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the workspace. Infrastructure crates implement
//! the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no network
//! dependencies. It defines *what* is needed; `llm` and `sheets` define *how*
//! to supply it, and `batch` drives the work.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`SpreadsheetId`, `SheetName`, `JobRunId`) |
//! | [`types`] | Value types (`JobRequest`, `ColumnIndex`, `BatchSpan`, `JobSummary`) |
//! | [`errors`] | Error taxonomy and `RetryPolicy` |
//! | [`cache`] | Per-job response cache |
//! | [`ports`] | `CompletionProvider` and `SheetStore` traits |

pub mod cache;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use cache::{CacheKey, ResponseCache};
pub use errors::{JobError, ProviderError, RetryPolicy, SheetError, Violation};
pub use identifiers::{JobRunId, SheetName, SpreadsheetId};
pub use ports::{CompletionProvider, SheetStore};
pub use types::{
    batch_spans, column_letter, error_placeholder, is_error_placeholder, BatchSpan, ColumnIndex,
    JobRequest, JobSummary, ProviderKind,
};
