use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort};
use crate::domain::{CanonicalField, Cell, RecordSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeStats {
    pub empty_rows_dropped: usize,
    pub duplicate_rows_dropped: usize,
}

/// Drops empty and duplicate rows, then orders by transaction time
pub struct RowSanitizer {
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl RowSanitizer {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>) -> Self {
        Self { diagnostics }
    }

    pub fn sanitize(&self, records: &mut RecordSet) -> SanitizeStats {
        let before = records.len();
        records.retain_rows(|row| !row.iter().all(Cell::is_null));
        let empty_rows_dropped = before - records.len();

        let before = records.len();
        let mut seen: HashSet<Vec<Cell>> = HashSet::new();
        records.retain_rows(|row| seen.insert(row.clone()));
        let duplicate_rows_dropped = before - records.len();

        // Stable; rows without a time sink to the bottom
        if let Some(idx) = records.column_index(CanonicalField::TransactionTime.as_str()) {
            records
                .rows_mut()
                .sort_by_key(|row| match row.get(idx).and_then(Cell::as_time) {
                    Some(t) => (false, Some(t)),
                    None => (true, None),
                });
        }

        let stats = SanitizeStats {
            empty_rows_dropped,
            duplicate_rows_dropped,
        };
        if stats.empty_rows_dropped + stats.duplicate_rows_dropped > 0 {
            self.diagnostics.emit(Diagnostic::info(
                DiagnosticKind::RowsDropped,
                format!(
                    "Dropped {} empty and {} duplicate rows",
                    stats.empty_rows_dropped, stats.duplicate_rows_dropped
                ),
            ));
        }
        stats
    }
}
