use std::sync::Arc;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort};

/// Index of the first line containing every token, if any
pub fn locate_header<S: AsRef<str>>(lines: &[S], tokens: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| tokens.iter().all(|token| line.as_ref().contains(token)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    /// Number of preamble lines to skip
    pub offset: usize,
    pub found: bool,
}

/// Finds the real header row beneath free-text preambles
pub struct HeaderLocator {
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl HeaderLocator {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>) -> Self {
        Self { diagnostics }
    }

    pub fn locate<S: AsRef<str>>(&self, lines: &[S], tokens: &[&str]) -> HeaderLocation {
        match locate_header(lines, tokens) {
            Some(offset) => {
                self.diagnostics.emit(Diagnostic::debug(
                    DiagnosticKind::Progress,
                    format!("Header row found at line {}", offset),
                ));
                HeaderLocation {
                    offset,
                    found: true,
                }
            }
            None => {
                self.diagnostics.emit(Diagnostic::warn(
                    DiagnosticKind::HeaderNotFound,
                    format!("No line contains all of {:?}; treating the first line as header", tokens),
                ));
                HeaderLocation {
                    offset: 0,
                    found: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::diagnostics_adapter::MemoryDiagnostics;

    const WECHAT_TOKENS: &[&str] = &["交易时间", "交易类型"];

    fn lines() -> Vec<String> {
        vec![
            "微信支付账单明细".to_string(),
            "起始时间：[2024-01-01 00:00:00]".to_string(),
            "----------------------微信支付账单明细列表--------------------".to_string(),
            "交易时间,交易类型,交易对方,商品,收/支,金额(元)".to_string(),
            "2024-01-02 10:00:00,商户消费,便利店,饮料,支出,¥5.00".to_string(),
        ]
    }

    #[test]
    fn test_finds_header_below_preamble() {
        assert_eq!(locate_header(&lines()[..], WECHAT_TOKENS), Some(3));
    }

    #[test]
    fn test_requires_every_token() {
        let partial = vec!["交易时间,金额".to_string()];
        assert_eq!(locate_header(&partial[..], WECHAT_TOKENS), None);
    }

    #[test]
    fn test_location_is_idempotent() {
        let source = lines();
        let first = locate_header(&source[..], WECHAT_TOKENS).unwrap();
        let sliced = &source[first..];
        assert_eq!(locate_header(sliced, WECHAT_TOKENS), Some(0));
    }

    #[test]
    fn test_missing_header_falls_back_with_warning() {
        let sink = MemoryDiagnostics::new();
        let locator = HeaderLocator::new(Arc::new(sink.clone()));
        let location = locator.locate(&["a,b,c", "1,2,3"][..], WECHAT_TOKENS);
        assert_eq!(location, HeaderLocation { offset: 0, found: false });
        assert!(sink.contains(DiagnosticKind::HeaderNotFound));
    }
}
