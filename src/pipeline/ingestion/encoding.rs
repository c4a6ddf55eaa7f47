//! Character-encoding probe for raw export files.
//!
//! Bill exports arrive as UTF-8 (with or without BOM), GBK from older
//! desktop tooling, occasionally UTF-16, and rarely a Western code page.
//! The detector tries each candidate against the first few lines and keeps
//! the first one that decodes without replacement.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use encoding_rs::{Encoding, GBK, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::Serialize;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort};
use crate::constants::ENCODING_PROBE_LINES;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    Utf8,
    Gbk,
    Utf16,
    Latin1,
}

impl SourceEncoding {
    /// Candidates in priority order
    pub const CANDIDATES: [SourceEncoding; 4] = [
        SourceEncoding::Utf8,
        SourceEncoding::Gbk,
        SourceEncoding::Utf16,
        SourceEncoding::Latin1,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Gbk => "gbk",
            Self::Utf16 => "utf-16",
            Self::Latin1 => "latin1",
        }
    }

    /// Concrete decoder for `bytes`. UTF-16 follows the byte-order mark and
    /// assumes little-endian without one.
    pub fn decoder_for(&self, bytes: &[u8]) -> &'static Encoding {
        match self {
            Self::Utf8 => UTF_8,
            Self::Gbk => GBK,
            Self::Utf16 if bytes.starts_with(&[0xFE, 0xFF]) => UTF_16BE,
            Self::Utf16 => UTF_16LE,
            Self::Latin1 => WINDOWS_1252,
        }
    }

    fn probe<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let prefix = line_prefix(bytes, ENCODING_PROBE_LINES);
        if *self != Self::Utf16 {
            return prefix;
        }

        // A cut prefix keeps whole code units and never ends on half a
        // surrogate pair. An odd-length whole file stays odd and fails.
        let mut len = prefix.len();
        if len == bytes.len() {
            return bytes;
        }
        if len % 2 == 1 {
            len += 1;
        }
        let big_endian = self.decoder_for(bytes) == UTF_16BE;
        if len >= 2 {
            let unit = if big_endian {
                u16::from_be_bytes([bytes[len - 2], bytes[len - 1]])
            } else {
                u16::from_le_bytes([bytes[len - 2], bytes[len - 1]])
            };
            if (0xD800..=0xDBFF).contains(&unit) {
                len -= 2;
            }
        }
        &bytes[..len]
    }

    /// True when the probe prefix of `bytes` decodes without replacement
    pub fn decodes_cleanly(&self, bytes: &[u8]) -> bool {
        self.decoder_for(bytes)
            .decode_without_bom_handling_and_without_replacement(self.probe(bytes))
            .is_some()
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bytes up to and including the `lines`-th newline (or everything)
fn line_prefix(bytes: &[u8], lines: usize) -> &[u8] {
    let mut seen = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'\n' {
            seen += 1;
            if seen == lines {
                return &bytes[..=idx];
            }
        }
    }
    bytes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingDetection {
    pub encoding: SourceEncoding,
    /// False when no candidate decoded and the default was used
    pub confident: bool,
}

pub struct EncodingDetector {
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl EncodingDetector {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>) -> Self {
        Self { diagnostics }
    }

    pub fn detect(&self, bytes: &[u8]) -> EncodingDetection {
        if let Some(encoding) = SourceEncoding::CANDIDATES
            .iter()
            .copied()
            .find(|candidate| candidate.decodes_cleanly(bytes))
        {
            self.diagnostics.emit(Diagnostic::debug(
                DiagnosticKind::Progress,
                format!("Detected encoding {}", encoding),
            ));
            return EncodingDetection {
                encoding,
                confident: true,
            };
        }

        self.diagnostics.emit(Diagnostic::warn(
            DiagnosticKind::EncodingUndetermined,
            "No candidate encoding decoded cleanly; falling back to utf-8",
        ));
        EncodingDetection {
            encoding: SourceEncoding::Utf8,
            confident: false,
        }
    }

    pub fn detect_path(&self, path: &Path) -> Result<EncodingDetection> {
        let bytes = std::fs::read(path)?;
        Ok(self.detect(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::diagnostics_adapter::MemoryDiagnostics;

    fn detector() -> (EncodingDetector, MemoryDiagnostics) {
        let sink = MemoryDiagnostics::new();
        (EncodingDetector::new(Arc::new(sink.clone())), sink)
    }

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_detects_utf8() {
        let (detector, _) = detector();
        let detection = detector.detect("交易时间,交易对方\n2024-01-01,商店\n".as_bytes());
        assert_eq!(detection.encoding, SourceEncoding::Utf8);
        assert!(detection.confident);
    }

    #[test]
    fn test_detects_gbk() {
        let (detector, _) = detector();
        let (bytes, _, _) = GBK.encode("交易时间,交易对方,金额\n2024-01-01,便利店,12.5\n");
        assert_eq!(detector.detect(&bytes).encoding, SourceEncoding::Gbk);
    }

    #[test]
    fn test_detects_utf16_with_bom() {
        let (detector, _) = detector();
        let bytes = utf16le_with_bom("交易时间,交易类型\n2024-01-01,支出\n");
        let detection = detector.detect(&bytes);
        assert_eq!(detection.encoding, SourceEncoding::Utf16);
        assert_eq!(detection.encoding.decoder_for(&bytes), UTF_16LE);
    }

    #[test]
    fn test_latin1_catches_stray_high_bytes() {
        let (detector, _) = detector();
        // 0xFF is neither valid UTF-8 nor a GBK lead byte; odd length rules out UTF-16
        let bytes = b"caf\xe9 \xff\n";
        assert_eq!(detector.detect(bytes).encoding, SourceEncoding::Latin1);
    }

    #[test]
    fn test_detect_path_reads_file() {
        let (detector, _) = detector();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bill.csv");
        std::fs::write(&path, "交易时间\n").unwrap();
        assert_eq!(detector.detect_path(&path).unwrap().encoding, SourceEncoding::Utf8);
        assert!(detector.detect_path(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_probe_only_reads_leading_lines() {
        let (detector, _) = detector();
        let mut bytes = "a\nb\nc\nd\ne\n".as_bytes().to_vec();
        bytes.extend_from_slice(b"\xff\xff");
        assert_eq!(detector.detect(&bytes).encoding, SourceEncoding::Utf8);
    }
}
