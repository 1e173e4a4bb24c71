//! Batch scheduling and sheet orchestration.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** [`Orchestrator`] sequences calls between the
//! [`pipeline::SheetStore`] and [`pipeline::CompletionProvider`] ports through
//! the [`BatchScheduler`]. It contains no HTTP or credential handling of its
//! own.

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{Orchestrator, DEFAULT_BATCH_SIZE, WRITE_DELAY};
pub use scheduler::{BatchScheduler, DEFAULT_CONCURRENCY, DEFAULT_INTERVAL};
