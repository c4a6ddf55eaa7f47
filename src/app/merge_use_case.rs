use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort, LedgerOutputPort};
use crate::constants::PROCESSED_SUFFIX;
use crate::domain::{CanonicalField, RecordSet};
use crate::error::Result;
use crate::pipeline::ingestion::{parse_delimited_with, RawTable, SourceEncoding};
use crate::pipeline::processing::{DirectionVocabulary, FieldNormalizer};

#[derive(Debug, Clone, Serialize)]
pub struct MergeSource {
    pub file: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeStats {
    pub output_file: PathBuf,
    pub sources: Vec<MergeSource>,
    pub total_rows: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    Merged(MergeStats),
    NothingToMerge,
}

/// Use case for unioning every normalized file into one ledger
pub struct MergeUseCase {
    diagnostics: Arc<dyn DiagnosticsPort>,
    output: Box<dyn LedgerOutputPort>,
    normalizer: FieldNormalizer,
}

impl MergeUseCase {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>, output: Box<dyn LedgerOutputPort>) -> Self {
        Self {
            normalizer: FieldNormalizer::new(diagnostics.clone()),
            diagnostics,
            output,
        }
    }

    /// Normalized files in `dir`, ordered by file name. A missing directory
    /// yields an empty list.
    pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let qualifies = path.is_file()
                && path
                    .file_name()
                    .map(|n| n.to_string_lossy().ends_with(PROCESSED_SUFFIX))
                    .unwrap_or(false);
            if qualifies {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    pub fn merge(&self, output_dir: &Path, merged_name: &str) -> Result<MergeOutcome> {
        let files = Self::discover(output_dir)?;
        if files.is_empty() {
            self.diagnostics.emit(Diagnostic::info(
                DiagnosticKind::EmptyInput,
                format!("No *{} files in {}; nothing to merge", PROCESSED_SUFFIX, output_dir.display()),
            ));
            return Ok(MergeOutcome::NothingToMerge);
        }

        let mut parts = Vec::with_capacity(files.len());
        for file in &files {
            parts.push(self.read_normalized(file)?);
        }

        // Canonical columns first, then extras in first-seen order
        let mut columns: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|f| f.as_str().to_string())
            .collect();
        for part in &parts {
            for column in part.columns() {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut merged = RecordSet::new(columns);
        let mut sources = Vec::with_capacity(parts.len());
        for (file, part) in files.iter().zip(&parts) {
            merged.append(part);
            sources.push(MergeSource {
                file: file.clone(),
                rows: part.len(),
            });
        }

        let output_file = output_dir.join(merged_name);
        self.output.write_record_set(&output_file, &merged)?;
        crate::observability::metrics::merge::completed(sources.len(), merged.len());
        self.diagnostics.emit(Diagnostic::info(
            DiagnosticKind::Progress,
            format!(
                "Merged {} files into {} ({} rows)",
                sources.len(),
                output_file.display(),
                merged.len()
            ),
        ));

        Ok(MergeOutcome::Merged(MergeStats {
            output_file,
            sources,
            total_rows: merged.len(),
            columns: merged.columns().to_vec(),
        }))
    }

    fn read_normalized(&self, path: &Path) -> Result<RecordSet> {
        let bytes = fs::read(path)?;
        let raw = RawTable::decode(&bytes, SourceEncoding::Utf8);
        let mut records = parse_delimited_with(&raw.body_from(0), b',')?;
        self.normalizer
            .normalize(&mut records, &DirectionVocabulary::CANONICAL);
        Ok(records)
    }
}
