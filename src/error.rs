use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file format '{extension}' for platform {platform}")]
    UnsupportedFormat { platform: String, extension: String },

    #[error("No parseable rows in {path} after header location")]
    NoRows { path: String },

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}

pub type Result<T> = std::result::Result<T, BillError>;
