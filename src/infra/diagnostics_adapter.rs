use std::sync::{Arc, Mutex};

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort, Severity};

/// Forwards diagnostics to the global `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl TracingDiagnostics {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticsPort for TracingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        let kind = format!("{:?}", diagnostic.kind);
        match diagnostic.severity {
            Severity::Debug => tracing::debug!(kind = %kind, "{}", diagnostic.message),
            Severity::Info => tracing::info!(kind = %kind, "{}", diagnostic.message),
            Severity::Warn => tracing::warn!(kind = %kind, "{}", diagnostic.message),
            Severity::Error => tracing::error!(kind = %kind, "{}", diagnostic.message),
        }
    }
}

/// In-memory sink for development/testing
#[derive(Debug, Clone, Default)]
pub struct MemoryDiagnostics {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.snapshot().iter().filter(|d| d.kind == kind).count()
    }

    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.count(kind) > 0
    }
}

impl DiagnosticsPort for MemoryDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut records) = self.records.lock() {
            records.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryDiagnostics::new();
        sink.emit(Diagnostic::warn(DiagnosticKind::HeaderNotFound, "no header"));
        sink.emit(Diagnostic::info(DiagnosticKind::Progress, "done"));

        let seen = sink.snapshot();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, DiagnosticKind::HeaderNotFound);
        assert!(sink.contains(DiagnosticKind::Progress));
        assert!(!sink.contains(DiagnosticKind::EmptyInput));
    }
}
