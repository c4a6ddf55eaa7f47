use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort, LedgerOutputPort};
use crate::constants;
use crate::domain::{CanonicalField, Cell, Direction, Platform, RecordSet};
use crate::error::{BillError, Result};
use crate::pipeline::ingestion::{
    parse_delimited, read_spreadsheet_rows, record_set_from_rows, EncodingDetector, HeaderLocator, RawTable,
    SourceEncoding,
};
use crate::pipeline::processing::platforms::PlatformProfile;
use crate::pipeline::processing::{
    FieldNormalizer, ReconciliationReport, RowSanitizer, SchemaReconciler,
};

/// Canonical fields looked up in source columns; `platform` is tagged, not read
const RECONCILED_FIELDS: [CanonicalField; 5] = [
    CanonicalField::TransactionTime,
    CanonicalField::Counterparty,
    CanonicalField::Amount,
    CanonicalField::Direction,
    CanonicalField::ProductName,
];

/// Statistics for one successfully cleaned file
#[derive(Debug, Clone, Serialize)]
pub struct CleanStats {
    pub platform: Platform,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    /// None for spreadsheet inputs
    pub encoding: Option<SourceEncoding>,
    pub header_offset: usize,
    pub header_found: bool,
    pub original_rows: usize,
    pub final_rows: usize,
    /// Fully empty rows dropped
    pub cleaned_rows: usize,
    pub deduplicated_rows: usize,
    pub columns: Vec<String>,
    pub reconciliation: ReconciliationReport,
    pub null_times: usize,
    pub null_amounts: usize,
    pub unknown_directions: usize,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    /// Leading output rows, rendered as written
    pub preview: Vec<Vec<String>>,
    /// Row counts per transaction type, most frequent first
    pub type_counts: Vec<TypeCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub label: String,
    pub count: usize,
}

impl CleanStats {
    pub fn net_total(&self) -> Decimal {
        self.income_total - self.expense_total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedFormat,
    NoRows,
    IoFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedFormat => "unsupported_format",
            FailureKind::NoRows => "no_rows",
            FailureKind::IoFailure => "io_failure",
        }
    }
}

impl From<&BillError> for FailureKind {
    fn from(error: &BillError) -> Self {
        match error {
            BillError::UnsupportedFormat { .. } => FailureKind::UnsupportedFormat,
            BillError::NoRows { .. } => FailureKind::NoRows,
            _ => FailureKind::IoFailure,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanOutcome {
    Success(CleanStats),
    Failed {
        input_file: PathBuf,
        kind: FailureKind,
        error: String,
    },
}

impl CleanOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CleanOutcome::Success(_))
    }

    pub fn stats(&self) -> Option<&CleanStats> {
        match self {
            CleanOutcome::Success(stats) => Some(stats),
            CleanOutcome::Failed { .. } => None,
        }
    }
}

/// Use case for cleaning one platform export into the canonical schema
pub struct CleanUseCase {
    diagnostics: Arc<dyn DiagnosticsPort>,
    output: Box<dyn LedgerOutputPort>,
    detector: EncodingDetector,
    locator: HeaderLocator,
    reconciler: SchemaReconciler,
    normalizer: FieldNormalizer,
    sanitizer: RowSanitizer,
}

impl CleanUseCase {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>, output: Box<dyn LedgerOutputPort>) -> Self {
        Self {
            detector: EncodingDetector::new(diagnostics.clone()),
            locator: HeaderLocator::new(diagnostics.clone()),
            reconciler: SchemaReconciler::new(diagnostics.clone()),
            normalizer: FieldNormalizer::new(diagnostics.clone()),
            sanitizer: RowSanitizer::new(diagnostics.clone()),
            diagnostics,
            output,
        }
    }

    /// Clean one file. Every failure is converted into `CleanOutcome::Failed`
    /// so the caller can carry on with sibling files.
    pub fn clean_file(&self, profile: &dyn PlatformProfile, input: &Path, output_dir: &Path) -> CleanOutcome {
        let platform = profile.platform();
        match self.try_clean(profile, input, output_dir) {
            Ok(stats) => {
                crate::observability::metrics::clean::file_processed(
                    platform.as_str(),
                    stats.original_rows,
                    stats.final_rows,
                    stats.cleaned_rows + stats.deduplicated_rows,
                );
                crate::observability::metrics::clean::values_nulled(
                    platform.as_str(),
                    stats.null_times + stats.null_amounts,
                );
                self.diagnostics.emit(Diagnostic::info(
                    DiagnosticKind::Progress,
                    format!(
                        "Cleaned {} -> {} ({} rows)",
                        input.display(),
                        stats.output_file.display(),
                        stats.final_rows
                    ),
                ));
                CleanOutcome::Success(stats)
            }
            Err(error) => {
                let kind = FailureKind::from(&error);
                crate::observability::metrics::clean::file_failed(platform.as_str(), kind.as_str());
                self.diagnostics.emit(Diagnostic::error(
                    DiagnosticKind::FileFailed,
                    format!("Failed to clean {}: {}", input.display(), error),
                ));
                CleanOutcome::Failed {
                    input_file: input.to_path_buf(),
                    kind,
                    error: error.to_string(),
                }
            }
        }
    }

    fn try_clean(&self, profile: &dyn PlatformProfile, input: &Path, output_dir: &Path) -> Result<CleanStats> {
        let platform = profile.platform();
        let extension = input
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !profile.supports_extension(&extension) {
            return Err(BillError::UnsupportedFormat {
                platform: platform.to_string(),
                extension,
            });
        }

        // Detect encoding, locate header, parse
        let (mut records, encoding, location) = if extension == "csv" {
            let bytes = fs::read(input)?;
            let detection = self.detector.detect(&bytes);
            let raw = RawTable::decode(&bytes, detection.encoding);
            if raw.lossy {
                self.diagnostics.emit(Diagnostic::warn(
                    DiagnosticKind::DecodeReplacement,
                    format!("Some bytes in {} could not be decoded as {}", input.display(), raw.encoding),
                ));
            }
            let location = self.locator.locate(&raw.lines[..], profile.header_tokens());
            let records = parse_delimited(&raw.body_from(location.offset))?;
            (records, Some(detection.encoding), location)
        } else {
            let rows = read_spreadsheet_rows(input)?;
            let joined: Vec<String> = rows.iter().map(|row| row.join(",")).collect();
            let location = self.locator.locate(&joined[..], profile.header_tokens());
            let records = record_set_from_rows(rows.into_iter().skip(location.offset).collect());
            (records, None, location)
        };

        let original_rows = records.len();
        if original_rows == 0 {
            return Err(BillError::NoRows {
                path: input.display().to_string(),
            });
        }

        let reconciliation = self
            .reconciler
            .reconcile(&mut records, profile.aliases(), &RECONCILED_FIELDS);
        let normalization = self
            .normalizer
            .normalize(&mut records, &profile.direction_vocabulary());
        let sanitized = self.sanitizer.sanitize(&mut records);

        records.set_constant_column(
            CanonicalField::Platform.as_str(),
            Cell::Text(platform.as_str().to_string()),
        );
        let records = canonical_layout(&records);
        let (income_total, expense_total) = totals(&records);

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_file = output_dir.join(constants::processed_file_name(platform.as_str(), &stem));
        self.output.write_record_set(&output_file, &records)?;

        Ok(CleanStats {
            platform,
            input_file: input.to_path_buf(),
            output_file,
            encoding,
            header_offset: location.offset,
            header_found: location.found,
            original_rows,
            final_rows: records.len(),
            cleaned_rows: sanitized.empty_rows_dropped,
            deduplicated_rows: sanitized.duplicate_rows_dropped,
            columns: records.columns().to_vec(),
            reconciliation,
            null_times: normalization.null_times,
            null_amounts: normalization.null_amounts,
            unknown_directions: normalization.unknown_directions,
            income_total,
            expense_total,
            preview: preview_rows(&records, constants::REPORT_PREVIEW_ROWS),
            type_counts: type_counts(&records, constants::TRANSACTION_TYPE_COLUMN),
        })
    }
}

/// Canonical columns in canonical order, then the source's extras in order
pub fn canonical_layout(records: &RecordSet) -> RecordSet {
    let mut columns: Vec<String> = CanonicalField::ALL
        .iter()
        .map(|f| f.as_str().to_string())
        .collect();
    columns.extend(
        records
            .columns()
            .iter()
            .filter(|c| !CanonicalField::is_canonical(c))
            .cloned(),
    );
    records.project(&columns)
}

/// First `limit` rows rendered the way the output file writes them
pub fn preview_rows(records: &RecordSet, limit: usize) -> Vec<Vec<String>> {
    records
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(Cell::render).collect())
        .collect()
}

/// Non-null values of `column` with their counts. Ties keep first-seen order.
pub fn type_counts(records: &RecordSet, column: &str) -> Vec<TypeCount> {
    let Some(idx) = records.column_index(column) else {
        return Vec::new();
    };

    let mut counts: Vec<TypeCount> = Vec::new();
    for cell in records.column_cells(idx) {
        if cell.is_null() {
            continue;
        }
        let label = cell.render();
        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(TypeCount { label, count: 1 }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn totals(records: &RecordSet) -> (Decimal, Decimal) {
    let amount = records.column_index(CanonicalField::Amount.as_str());
    let direction = records.column_index(CanonicalField::Direction.as_str());
    let (Some(amount), Some(direction)) = (amount, direction) else {
        return (Decimal::ZERO, Decimal::ZERO);
    };

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for row in records.rows() {
        let value = match row[amount].as_amount() {
            Some(value) => value,
            None => continue,
        };
        match row[direction].as_text().and_then(Direction::from_canonical) {
            Some(Direction::Income) => income += value,
            Some(Direction::Expense) => expense += value,
            _ => {}
        }
    }
    (income, expense)
}
