// Table parsing: decoded text or spreadsheet rows into a RecordSet

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};

use super::encoding::SourceEncoding;
use crate::constants::OUTPUT_TIME_FORMAT;
use crate::domain::{Cell, RecordSet};
use crate::error::Result;

/// Decoded source lines, alive only until the header is located
#[derive(Debug, Clone)]
pub struct RawTable {
    pub lines: Vec<String>,
    pub encoding: SourceEncoding,
    /// True when some bytes had to be replaced during decoding
    pub lossy: bool,
}

impl RawTable {
    pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> Self {
        let (text, lossy) = encoding
            .decoder_for(bytes)
            .decode_without_bom_handling(bytes);
        let text: &str = &text;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        Self {
            lines: text.lines().map(str::to_string).collect(),
            encoding,
            lossy,
        }
    }

    /// Text from `offset` onward, rejoined for the CSV reader
    pub fn body_from(&self, offset: usize) -> String {
        self.lines
            .get(offset..)
            .map(|lines| lines.join("\n"))
            .unwrap_or_default()
    }
}

/// Delimiters seen in bill exports; comma first so it wins ties
const DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// Non-blank lines considered when sniffing
const SNIFF_LINES: usize = 10;

/// Fields in `line` when split on `delimiter` outside double quotes
fn field_count(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    let mut fields = 1;
    for byte in line.bytes() {
        if byte == b'"' {
            quoted = !quoted;
        } else if byte == delimiter && !quoted {
            fields += 1;
        }
    }
    fields
}

/// Pick the delimiter for a header-located body. The header decides the
/// width; rows that agree with it add weight. Comma when nothing splits.
pub fn sniff_delimiter(body: &str) -> u8 {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty()).take(SNIFF_LINES);
    let Some(header) = lines.next() else {
        return b',';
    };
    let rows: Vec<&str> = lines.collect();

    let mut best = (b',', 0);
    for delimiter in DELIMITERS {
        let width = field_count(header, delimiter);
        if width <= 1 {
            continue;
        }
        let agreeing = rows.iter().filter(|row| field_count(row, delimiter) == width).count();
        let score = width * (agreeing + 1);
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

/// Parse header-first delimited text with a sniffed delimiter.
/// Fails only on reader errors.
pub fn parse_delimited(content: &str) -> Result<RecordSet> {
    parse_delimited_with(content, sniff_delimiter(content))
}

pub fn parse_delimited_with(content: &str, delimiter: u8) -> Result<RecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(record_set_from_rows(rows))
}

/// First row becomes the header; the rest become text cells
pub fn record_set_from_rows(rows: Vec<Vec<String>>) -> RecordSet {
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(header) => header,
        None => return RecordSet::default(),
    };

    let blank: Vec<bool> = header.iter().map(|h| clean_header(h).is_empty()).collect();
    let columns = unique_headers(&header);
    let body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(|raw| Cell::from_raw(raw)).collect())
        .collect();
    let set = RecordSet::from_rows(columns, body);

    // Trailing delimiters leave nameless, empty columns behind
    let keep: Vec<String> = set
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| !(blank[*idx] && set.column_cells(*idx).all(Cell::is_null)))
        .map(|(_, name)| name.clone())
        .collect();
    if keep.len() == set.columns().len() {
        set
    } else {
        set.project(&keep)
    }
}

fn clean_header(raw: &str) -> String {
    raw.replace(['\n', '\r'], "")
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .to_string()
}

fn unique_headers(header: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let base = match clean_header(raw) {
                name if name.is_empty() => format!("unnamed_{}", idx),
                name => name,
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Read every row of the first worksheet as display text
pub fn read_spreadsheet_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    let first = match workbook.sheet_names().first().cloned() {
        Some(name) => name,
        None => return Ok(Vec::new()),
    };
    let range = workbook.worksheet_range(&first)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(spreadsheet_text).collect())
        .collect())
}

fn spreadsheet_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => excel_serial_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// 1900 date system serial to `OUTPUT_TIME_FORMAT` text. Out-of-range serials
/// keep their numeric text.
fn excel_serial_text(serial: f64) -> String {
    let seconds = (serial * 86_400.0).round();
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .filter(|_| seconds.is_finite() && seconds.abs() < i64::MAX as f64)
        .and_then(|epoch| Duration::try_seconds(seconds as i64).and_then(|offset| epoch.checked_add_signed(offset)))
        .map(|dt| dt.format(OUTPUT_TIME_FORMAT).to_string())
        .unwrap_or_else(|| serial.to_string())
}
