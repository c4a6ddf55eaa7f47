use crate::app::ports::LedgerOutputPort;
use crate::domain::RecordSet;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File-based implementation of LedgerOutputPort.
/// Writes record sets as comma-separated UTF-8 with a leading BOM so the
/// files open cleanly in spreadsheet tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLedgerOutputAdapter;

impl CsvLedgerOutputAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl LedgerOutputPort for CsvLedgerOutputAdapter {
    fn write_record_set(&self, path: &Path, records: &RecordSet) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new().from_writer(file);
        writer.write_record(records.columns())?;
        for row in records.rows() {
            writer.write_record(row.iter().map(|cell| cell.render()))?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", records.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn test_writes_bom_header_and_rendered_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let records = RecordSet::from_rows(
            vec!["amount".to_string(), "counterparty".to_string()],
            vec![vec![
                Cell::Amount(Decimal::from_str("12.50").unwrap()),
                Cell::Text("便利店, 朝阳".to_string()),
            ]],
        );

        CsvLedgerOutputAdapter::new().write_record_set(&path, &records).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "amount,counterparty\n12.50,\"便利店, 朝阳\"\n");
    }
}
