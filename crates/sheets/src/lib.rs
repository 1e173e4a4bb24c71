//! Google Sheets infrastructure adapter.
//!
//! Implements the [`pipeline::SheetStore`] trait over the Sheets v4 REST API,
//! authenticating as a service account.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Credential loading, OAuth token exchange, A1 range
//! construction, and HTTP calls live here. Failures are wrapped with context
//! and returned; nothing is retried inside this crate.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`credentials`] | `ServiceAccountKey` from a path or inline JSON |
//! | [`auth`] | `TokenSource`: RS256 assertion → cached access token |
//! | [`range`] | A1 ranges for the source and result columns |
//! | [`client`] | `SheetsClient`, the `SheetStore` implementation |

pub mod auth;
pub mod client;
pub mod credentials;
pub mod range;

pub use auth::TokenSource;
pub use client::{column_texts, SheetsClient, ValueRange};
pub use credentials::ServiceAccountKey;
pub use range::{quote_sheet, read_range, write_range};
