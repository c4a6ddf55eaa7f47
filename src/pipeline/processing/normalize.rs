// Field normalization: datetime, amount, and direction coercion

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort};
use crate::domain::{CanonicalField, Cell, Direction, RecordSet};

/// Currency glyphs, thousands separators and whitespace
static AMOUNT_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[¥￥,\s]").expect("valid amount regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = AMOUNT_NOISE.replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Platform-specific free-text direction labels
#[derive(Debug, Clone, Copy)]
pub struct DirectionVocabulary {
    pub income: &'static [&'static str],
    pub expense: &'static [&'static str],
}

impl DirectionVocabulary {
    /// Accepts only the canonical labels; used when re-reading normalized files
    pub const CANONICAL: DirectionVocabulary = DirectionVocabulary {
        income: &[],
        expense: &[],
    };

    pub fn classify(&self, label: &str) -> Direction {
        let label = label.trim();
        if let Some(direction) = Direction::from_canonical(label) {
            return direction;
        }
        if self.income.iter().any(|t| *t == label) {
            Direction::Income
        } else if self.expense.iter().any(|t| *t == label) {
            Direction::Expense
        } else {
            Direction::Unknown
        }
    }
}

/// Values coerced to null (or to `unknown`) during one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    pub null_times: usize,
    pub null_amounts: usize,
    pub unknown_directions: usize,
}

impl NormalizationStats {
    pub fn total(&self) -> usize {
        self.null_times + self.null_amounts + self.unknown_directions
    }
}

pub struct FieldNormalizer {
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl FieldNormalizer {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>) -> Self {
        Self { diagnostics }
    }

    /// Coerce every present canonical column. Absent columns are skipped;
    /// already-typed cells are left alone.
    pub fn normalize(&self, records: &mut RecordSet, vocabulary: &DirectionVocabulary) -> NormalizationStats {
        let mut stats = NormalizationStats::default();

        if let Some(idx) = records.column_index(CanonicalField::TransactionTime.as_str()) {
            for cell in records.column_cells_mut(idx) {
                if let Cell::Text(raw) = cell {
                    *cell = match parse_time(raw) {
                        Some(t) => Cell::Time(t),
                        None => {
                            stats.null_times += 1;
                            Cell::Null
                        }
                    };
                }
            }
        }

        if let Some(idx) = records.column_index(CanonicalField::Amount.as_str()) {
            for cell in records.column_cells_mut(idx) {
                if let Cell::Text(raw) = cell {
                    *cell = match parse_amount(raw) {
                        Some(d) => Cell::Amount(d),
                        None => {
                            stats.null_amounts += 1;
                            Cell::Null
                        }
                    };
                }
            }
        }

        if let Some(idx) = records.column_index(CanonicalField::Direction.as_str()) {
            for cell in records.column_cells_mut(idx) {
                if let Cell::Text(raw) = cell {
                    let direction = vocabulary.classify(raw);
                    if direction == Direction::Unknown && raw.as_str() != Direction::Unknown.as_str() {
                        stats.unknown_directions += 1;
                    }
                    *cell = Cell::Text(direction.as_str().to_string());
                }
            }
        }

        if stats.total() > 0 {
            self.diagnostics.emit(Diagnostic::warn(
                DiagnosticKind::FieldParseFailure,
                format!(
                    "Coerced {} times and {} amounts to null; {} directions unrecognized",
                    stats.null_times, stats.null_amounts, stats.unknown_directions
                ),
            ));
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::diagnostics_adapter::MemoryDiagnostics;

    const ALIPAY_LIKE: DirectionVocabulary = DirectionVocabulary {
        income: &["收入", "转入"],
        expense: &["支出", "转出"],
    };

    fn records() -> RecordSet {
        RecordSet::from_rows(
            vec!["transaction_time".into(), "amount".into(), "direction".into(), "备注".into()],
            vec![
                vec![
                    Cell::from_raw("2024/01/02 08:30"),
                    Cell::from_raw("¥1,234.56"),
                    Cell::from_raw("支出"),
                    Cell::from_raw("abc"),
                ],
                vec![
                    Cell::from_raw("not a date"),
                    Cell::from_raw("abc"),
                    Cell::from_raw("不计收支"),
                    Cell::Null,
                ],
            ],
        )
    }

    #[test]
    fn test_parse_amount_strips_noise() {
        assert_eq!(parse_amount("¥1,234.56"), Some(Decimal::from_str("1234.56").unwrap()));
        assert_eq!(parse_amount(" ￥ 8.00 "), Some(Decimal::from_str("8.00").unwrap()));
        assert_eq!(parse_amount("-12"), Some(Decimal::from(-12)));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("¥"), None);
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(parse_time("2024-01-02 08:30:00"), Some(expected));
        assert_eq!(parse_time("2024/01/02 08:30"), Some(expected));
        assert_eq!(parse_time("2024-01-02T08:30:00"), Some(expected));
        assert_eq!(
            parse_time("2024年01月02日"),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn test_classify_direction() {
        assert_eq!(ALIPAY_LIKE.classify("转入"), Direction::Income);
        assert_eq!(ALIPAY_LIKE.classify("支出"), Direction::Expense);
        assert_eq!(ALIPAY_LIKE.classify("/"), Direction::Unknown);
        assert_eq!(DirectionVocabulary::CANONICAL.classify("expense"), Direction::Expense);
    }

    #[test]
    fn test_normalize_coerces_and_counts() {
        let sink = MemoryDiagnostics::new();
        let normalizer = FieldNormalizer::new(Arc::new(sink.clone()));
        let mut set = records();

        let stats = normalizer.normalize(&mut set, &ALIPAY_LIKE);

        assert_eq!(
            stats,
            NormalizationStats { null_times: 1, null_amounts: 1, unknown_directions: 1 }
        );
        assert_eq!(set.get(0, "amount"), Some(&Cell::Amount(Decimal::from_str("1234.56").unwrap())));
        assert_eq!(set.get(0, "direction"), Some(&Cell::Text("expense".to_string())));
        assert_eq!(set.get(1, "transaction_time"), Some(&Cell::Null));
        // Non-canonical columns untouched
        assert_eq!(set.get(0, "备注"), Some(&Cell::Text("abc".to_string())));
        assert!(sink.contains(DiagnosticKind::FieldParseFailure));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = FieldNormalizer::new(Arc::new(MemoryDiagnostics::new()));
        let mut set = records();
        normalizer.normalize(&mut set, &ALIPAY_LIKE);
        let once = set.clone();

        let second = normalizer.normalize(&mut set, &ALIPAY_LIKE);

        assert_eq!(set, once);
        assert_eq!(second, NormalizationStats::default());
    }
}
