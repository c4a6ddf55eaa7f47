// Pipeline ingestion: encoding detection, header location, and table parsing

pub mod encoding;
pub mod header;
pub mod table_reader;

pub use encoding::{EncodingDetection, EncodingDetector, SourceEncoding};
pub use header::{locate_header, HeaderLocation, HeaderLocator};
pub use table_reader::{parse_delimited, parse_delimited_with, read_spreadsheet_rows, record_set_from_rows, RawTable};
