//! Newtype domain identifiers.
//!
//! A spreadsheet ID and a sheet (tab) name are both plain strings on the wire,
//! but passing one where the other is expected produces a confusing 404 from
//! the Sheets API rather than a compile error. Wrapping each in its own newtype
//! moves that mistake to the type checker.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies a Google spreadsheet document (the long ID in its URL).
    SpreadsheetId
}

string_id! {
    /// Names one tab inside a spreadsheet (e.g. `"Sheet1"`).
    SheetName
}

// ---------------------------------------------------------------------------
// Run identifier
// ---------------------------------------------------------------------------

/// Identifies a single job invocation.
///
/// Generated fresh for every process run and attached to the root tracing
/// span so all log lines from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRunId(Uuid);

impl JobRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for JobRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
