//! Domain data shapes shared across the pipeline: platforms, the canonical
//! schema, and the tabular record set every stage mutates in place.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::BillError;

/// The payment platform a bill export came from. Doubles as the provenance tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Alipay,
    Wechat,
    Jingdong,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Alipay, Platform::Wechat, Platform::Jingdong];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alipay => constants::ALIPAY,
            Self::Wechat => constants::WECHAT,
            Self::Jingdong => constants::JINGDONG,
        }
    }

    /// Name used in human-facing reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Alipay => "支付宝",
            Self::Wechat => "微信",
            Self::Jingdong => "京东",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            constants::ALIPAY => Ok(Self::Alipay),
            constants::WECHAT => Ok(Self::Wechat),
            constants::JINGDONG | "jd" => Ok(Self::Jingdong),
            other => Err(BillError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Canonical money-flow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    Expense,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Unknown => "unknown",
        }
    }

    /// Parse an already-canonical label; free-text labels go through the
    /// platform vocabulary instead.
    pub fn from_canonical(label: &str) -> Option<Self> {
        match label {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// The fixed canonical field set, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    TransactionTime,
    Counterparty,
    Amount,
    Direction,
    ProductName,
    Platform,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::TransactionTime,
        CanonicalField::Counterparty,
        CanonicalField::Amount,
        CanonicalField::Direction,
        CanonicalField::ProductName,
        CanonicalField::Platform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransactionTime => constants::FIELD_TRANSACTION_TIME,
            Self::Counterparty => constants::FIELD_COUNTERPARTY,
            Self::Amount => constants::FIELD_AMOUNT,
            Self::Direction => constants::FIELD_DIRECTION,
            Self::ProductName => constants::FIELD_PRODUCT_NAME,
            Self::Platform => constants::FIELD_PLATFORM,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    pub fn is_canonical(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value. Raw input arrives as `Text`; the field normalizer
/// coerces canonical columns into typed variants or `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Null,
    Text(String),
    Amount(Decimal),
    Time(NaiveDateTime),
}

impl Cell {
    /// Build a cell from raw field text. Surrounding whitespace (including the
    /// tab padding some exports append) is dropped; blank becomes `Null`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Null
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            Cell::Amount(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Text written to output files
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Amount(d) => d.to_string(),
            Cell::Time(t) => t.format(constants::OUTPUT_TIME_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// An ordered set of rows sharing one ordered, unique column list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a record set, padding short rows with `Null` and truncating long ones
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row);
        }
        set
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Rename a column in place. Returns false if `to` already names another column.
    pub fn rename_column(&mut self, index: usize, to: &str) -> bool {
        if self.column_index(to).is_some_and(|existing| existing != index) {
            return false;
        }
        if let Some(name) = self.columns.get_mut(index) {
            *name = to.to_string();
            true
        } else {
            false
        }
    }

    /// Add a column filled with `fill`, or overwrite every cell if it exists.
    pub fn set_constant_column(&mut self, name: &str, fill: Cell) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = fill.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(fill.clone());
                }
            }
        }
    }

    /// Mutable access to every cell of one column
    pub fn column_cells_mut(&mut self, index: usize) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().filter_map(move |row| row.get_mut(index))
    }

    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn retain_rows<F>(&mut self, keep: F)
    where
        F: FnMut(&Vec<Cell>) -> bool,
    {
        self.rows.retain(keep);
    }

    pub fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }

    /// Reorder and/or widen to exactly `columns`; missing columns become `Null`,
    /// columns not listed are dropped.
    pub fn project(&self, columns: &[String]) -> RecordSet {
        let mapping: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                mapping
                    .iter()
                    .map(|m| m.and_then(|i| row.get(i).cloned()).unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();
        RecordSet {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Append every row of `other`, aligning by column name
    pub fn append(&mut self, other: &RecordSet) {
        let aligned = other.project(&self.columns);
        self.rows.extend(aligned.rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_platform_round_trips_through_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert!("paypal".parse::<Platform>().is_err());
    }

    #[test]
    fn test_cell_from_raw_trims_tab_padding() {
        assert_eq!(Cell::from_raw("  商户\t"), Cell::Text("商户".to_string()));
        assert_eq!(Cell::from_raw("\t "), Cell::Null);
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let set = RecordSet::from_rows(cols(&["a", "b", "c"]), vec![vec![Cell::from_raw("1")]]);
        assert_eq!(set.rows()[0].len(), 3);
        assert_eq!(set.rows()[0][2], Cell::Null);
    }

    #[test]
    fn test_rename_refuses_collision() {
        let mut set = RecordSet::new(cols(&["a", "b"]));
        assert!(!set.rename_column(1, "a"));
        assert!(set.rename_column(1, "c"));
        assert_eq!(set.columns(), &["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_append_aligns_by_name() {
        let mut left = RecordSet::new(cols(&["x", "y"]));
        let right = RecordSet::from_rows(
            cols(&["y", "z"]),
            vec![vec![Cell::from_raw("y1"), Cell::from_raw("z1")]],
        );
        left.append(&right);
        assert_eq!(left.rows()[0], vec![Cell::Null, Cell::from_raw("y1")]);
    }
}
