/// Platform and file naming constants shared across the pipeline.
/// These define the contract with downstream consumers of the output files.

// Platform identifiers (written into the `platform` column)
pub const ALIPAY: &str = "alipay";
pub const WECHAT: &str = "wechat";
pub const JINGDONG: &str = "jingdong";

// Canonical column names
pub const FIELD_TRANSACTION_TIME: &str = "transaction_time";
pub const FIELD_COUNTERPARTY: &str = "counterparty";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_DIRECTION: &str = "direction";
pub const FIELD_PRODUCT_NAME: &str = "product_name";
pub const FIELD_PLATFORM: &str = "platform";

// Output naming
pub const PROCESSED_SUFFIX: &str = "_processed.csv";
pub const DEFAULT_MERGED_FILE: &str = "all_bills_merged.csv";
pub const REPORT_FILE: &str = "integrated_processing_report.md";

/// Passthrough column whose values are tallied in the report
pub const TRANSACTION_TYPE_COLUMN: &str = "交易类型";

/// Cleaned rows shown in each file's report preview
pub const REPORT_PREVIEW_ROWS: usize = 5;

/// Datetime format used when writing normalized output
pub const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of leading lines probed by the encoding detector
pub const ENCODING_PROBE_LINES: usize = 5;

/// Build the normalized output file name for a processed input
pub fn processed_file_name(platform: &str, original_stem: &str) -> String {
    format!("{platform}_{original_stem}{PROCESSED_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_name_follows_convention() {
        assert_eq!(
            processed_file_name(WECHAT, "微信支付账单(20240101-20240131)"),
            "wechat_微信支付账单(20240101-20240131)_processed.csv"
        );
    }
}
