use std::fmt;

/// Every metric the cleaner records, grouped by phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Clean metrics
    CleanFilesProcessed,
    CleanFilesFailed,
    CleanRowsRead,
    CleanRowsWritten,
    CleanRowsDropped,
    CleanValuesNulled,

    // Merge metrics
    MergeRuns,
    MergeSourceFiles,
    MergeRowsWritten,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CleanFilesProcessed => "bill_cleaner_clean_files_processed_total",
            MetricName::CleanFilesFailed => "bill_cleaner_clean_files_failed_total",
            MetricName::CleanRowsRead => "bill_cleaner_clean_rows_read_total",
            MetricName::CleanRowsWritten => "bill_cleaner_clean_rows_written_total",
            MetricName::CleanRowsDropped => "bill_cleaner_clean_rows_dropped_total",
            MetricName::CleanValuesNulled => "bill_cleaner_clean_values_nulled_total",

            MetricName::MergeRuns => "bill_cleaner_merge_runs_total",
            MetricName::MergeSourceFiles => "bill_cleaner_merge_source_files_total",
            MetricName::MergeRowsWritten => "bill_cleaner_merge_rows_written_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            CleanFilesProcessed,
            CleanFilesFailed,
            CleanRowsRead,
            CleanRowsWritten,
            CleanRowsDropped,
            CleanValuesNulled,
            MergeRuns,
            MergeSourceFiles,
            MergeRowsWritten,
        ]
        .into_iter()
    }

    /// Returns (phase, description)
    pub fn metadata(&self) -> (&'static str, &'static str) {
        match self {
            MetricName::CleanFilesProcessed => ("clean", "Input files cleaned successfully"),
            MetricName::CleanFilesFailed => ("clean", "Input files that failed to clean"),
            MetricName::CleanRowsRead => ("clean", "Rows parsed after the header"),
            MetricName::CleanRowsWritten => ("clean", "Rows written to normalized files"),
            MetricName::CleanRowsDropped => ("clean", "Empty or duplicate rows dropped"),
            MetricName::CleanValuesNulled => ("clean", "Field values coerced to null"),

            MetricName::MergeRuns => ("merge", "Merged ledgers written"),
            MetricName::MergeSourceFiles => ("merge", "Normalized files merged"),
            MetricName::MergeRowsWritten => ("merge", "Rows written to the merged ledger"),
        }
    }
}

pub mod clean {
    use super::MetricName;

    /// Record a cleaned file. Platform is attached as a label.
    pub fn file_processed(platform: &str, rows_read: usize, rows_written: usize, rows_dropped: usize) {
        let platform = platform.to_string();
        ::metrics::counter!(MetricName::CleanFilesProcessed.as_str(), "platform" => platform.clone()).increment(1);
        ::metrics::counter!(MetricName::CleanRowsRead.as_str(), "platform" => platform.clone())
            .increment(rows_read as u64);
        ::metrics::counter!(MetricName::CleanRowsWritten.as_str(), "platform" => platform.clone())
            .increment(rows_written as u64);
        ::metrics::counter!(MetricName::CleanRowsDropped.as_str(), "platform" => platform)
            .increment(rows_dropped as u64);
    }

    pub fn values_nulled(platform: &str, count: usize) {
        ::metrics::counter!(MetricName::CleanValuesNulled.as_str(), "platform" => platform.to_string())
            .increment(count as u64);
    }

    pub fn file_failed(platform: &str, reason: &str) {
        ::metrics::counter!(
            MetricName::CleanFilesFailed.as_str(),
            "platform" => platform.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }
}

pub mod merge {
    use super::MetricName;

    pub fn completed(source_files: usize, rows_written: usize) {
        ::metrics::counter!(MetricName::MergeRuns.as_str()).increment(1);
        ::metrics::counter!(MetricName::MergeSourceFiles.as_str()).increment(source_files as u64);
        ::metrics::counter!(MetricName::MergeRowsWritten.as_str()).increment(rows_written as u64);
    }
}
