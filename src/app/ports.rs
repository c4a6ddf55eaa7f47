use std::path::Path;

use serde::Serialize;

use crate::domain::RecordSet;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// What a diagnostic is about. Soft conditions never become errors; they
/// surface here instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Progress,
    EncodingUndetermined,
    DecodeReplacement,
    HeaderNotFound,
    FieldUnresolved,
    FieldAmbiguous,
    ColumnConflict,
    FieldParseFailure,
    RowsDropped,
    EmptyInput,
    FileFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
        }
    }

    pub fn debug(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, kind, message)
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, message)
    }

    pub fn warn(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, kind, message)
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }
}

/// Sink for pipeline diagnostics, handed to each component at construction
pub trait DiagnosticsPort: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Destination for finished record sets (normalized files and the merged ledger)
pub trait LedgerOutputPort: Send + Sync {
    fn write_record_set(&self, path: &Path, records: &RecordSet) -> Result<()>;
}
