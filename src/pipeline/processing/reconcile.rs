//! Schema reconciliation: map a source's raw column names onto the canonical
//! field set.
//!
//! Resolution runs in two phases. Phase one accepts the canonical name or a
//! platform alias verbatim and renames the column. Phase two looks for
//! substring overlap on whatever is still missing and only *proposes*
//! candidates; nothing found in phase two is ever renamed.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort, Severity};
use crate::domain::{CanonicalField, RecordSet};

/// Per-platform alias table. Any listed alias claims a column verbatim.
pub type AliasTable = [(CanonicalField, &'static [&'static str])];

/// Fields whose absence makes an output file of little use
const REQUIRED_FIELDS: [CanonicalField; 3] = [
    CanonicalField::TransactionTime,
    CanonicalField::Counterparty,
    CanonicalField::Amount,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Alias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldResolution {
    Resolved { raw: String, via: MatchKind },
    /// Substring candidates, advisory only
    Ambiguous { candidates: Vec<String> },
    Unresolved,
}

impl FieldResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldResolution::Resolved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReconciliation {
    pub field: CanonicalField,
    pub resolution: FieldResolution,
}

/// Two raw columns matched the same field; `ignored` keeps its raw name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnConflict {
    pub field: CanonicalField,
    pub kept: String,
    pub ignored: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub fields: Vec<FieldReconciliation>,
    pub conflicts: Vec<ColumnConflict>,
}

impl ReconciliationReport {
    pub fn get(&self, field: CanonicalField) -> Option<&FieldResolution> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.resolution)
    }

    pub fn resolved_count(&self) -> usize {
        self.fields.iter().filter(|f| f.resolution.is_resolved()).count()
    }

    /// Fields left without a column (ambiguous ones included)
    pub fn missing(&self) -> Vec<CanonicalField> {
        self.fields
            .iter()
            .filter(|f| !f.resolution.is_resolved())
            .map(|f| f.field)
            .collect()
    }
}

fn names_for(field: CanonicalField, aliases: &AliasTable) -> Vec<&'static str> {
    let mut names = vec![field.as_str()];
    for (aliased, list) in aliases {
        if *aliased == field {
            names.extend(list.iter().copied());
        }
    }
    names
}

/// Pure resolution of `columns` against `fields`. Never fails.
pub fn resolve(columns: &[String], aliases: &AliasTable, fields: &[CanonicalField]) -> ReconciliationReport {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut resolutions: Vec<Option<FieldResolution>> = vec![None; fields.len()];
    let mut conflicts = Vec::new();

    // Phase 1: verbatim names, first matching raw column wins
    for (slot, field) in fields.iter().enumerate() {
        let names = names_for(*field, aliases);
        let matched: Vec<&str> = columns
            .iter()
            .map(String::as_str)
            .filter(|c| !claimed.contains(c))
            .filter(|c| names.iter().any(|n| n == c))
            .collect();

        if let Some(winner) = matched.first().copied() {
            claimed.insert(winner);
            for loser in matched.iter().skip(1) {
                conflicts.push(ColumnConflict {
                    field: *field,
                    kept: winner.to_string(),
                    ignored: loser.to_string(),
                });
            }
            let via = if winner == field.as_str() {
                MatchKind::Exact
            } else {
                MatchKind::Alias
            };
            resolutions[slot] = Some(FieldResolution::Resolved {
                raw: winner.to_string(),
                via,
            });
        }
    }

    // Phase 2: substring overlap in either direction, advisory
    for (slot, field) in fields.iter().enumerate() {
        if resolutions[slot].is_some() {
            continue;
        }
        let names = names_for(*field, aliases);
        let candidates: Vec<String> = columns
            .iter()
            .filter(|c| !claimed.contains(c.as_str()))
            .filter(|c| names.iter().any(|n| c.contains(n) || n.contains(c.as_str())))
            .cloned()
            .collect();
        resolutions[slot] = Some(if candidates.is_empty() {
            FieldResolution::Unresolved
        } else {
            FieldResolution::Ambiguous { candidates }
        });
    }

    ReconciliationReport {
        fields: fields
            .iter()
            .zip(resolutions)
            .map(|(field, resolution)| FieldReconciliation {
                field: *field,
                resolution: resolution.unwrap_or(FieldResolution::Unresolved),
            })
            .collect(),
        conflicts,
    }
}

pub struct SchemaReconciler {
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl SchemaReconciler {
    pub fn new(diagnostics: Arc<dyn DiagnosticsPort>) -> Self {
        Self { diagnostics }
    }

    /// Resolve and apply phase-one renames to `records` in place
    pub fn reconcile(
        &self,
        records: &mut RecordSet,
        aliases: &AliasTable,
        fields: &[CanonicalField],
    ) -> ReconciliationReport {
        let report = resolve(records.columns(), aliases, fields);

        for conflict in &report.conflicts {
            self.diagnostics.emit(Diagnostic::warn(
                DiagnosticKind::ColumnConflict,
                format!(
                    "Columns '{}' and '{}' both map to {}; keeping '{}'",
                    conflict.kept, conflict.ignored, conflict.field, conflict.kept
                ),
            ));
        }

        for entry in &report.fields {
            match &entry.resolution {
                FieldResolution::Resolved { raw, via } => {
                    if *via == MatchKind::Exact {
                        continue;
                    }
                    let renamed = records
                        .column_index(raw)
                        .map(|idx| records.rename_column(idx, entry.field.as_str()))
                        .unwrap_or(false);
                    if renamed {
                        self.diagnostics.emit(Diagnostic::debug(
                            DiagnosticKind::Progress,
                            format!("Renamed column '{}' to {}", raw, entry.field),
                        ));
                    } else {
                        self.diagnostics.emit(Diagnostic::warn(
                            DiagnosticKind::ColumnConflict,
                            format!("Could not rename column '{}' to {}", raw, entry.field),
                        ));
                    }
                }
                FieldResolution::Ambiguous { candidates } => {
                    self.diagnostics.emit(Diagnostic::warn(
                        DiagnosticKind::FieldAmbiguous,
                        format!(
                            "No exact column for {}; possible matches {:?} were not applied",
                            entry.field, candidates
                        ),
                    ));
                }
                FieldResolution::Unresolved => {
                    let severity = if REQUIRED_FIELDS.contains(&entry.field) {
                        Severity::Warn
                    } else {
                        Severity::Info
                    };
                    self.diagnostics.emit(Diagnostic::new(
                        severity,
                        DiagnosticKind::FieldUnresolved,
                        format!("No column found for {}", entry.field),
                    ));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::diagnostics_adapter::MemoryDiagnostics;

    const ALIASES: &AliasTable = &[
        (CanonicalField::Amount, &["金额(元)", "金额"]),
        (CanonicalField::ProductName, &["商品"]),
        (CanonicalField::Counterparty, &["交易对方"]),
    ];

    const FIELDS: &[CanonicalField] = &[
        CanonicalField::Counterparty,
        CanonicalField::Amount,
        CanonicalField::ProductName,
    ];

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_alias_and_exact_matches_resolve() {
        let report = resolve(&cols(&["交易对方", "金额(元)", "product_name"]), ALIASES, FIELDS);
        assert_eq!(
            report.get(CanonicalField::Amount),
            Some(&FieldResolution::Resolved { raw: "金额(元)".to_string(), via: MatchKind::Alias })
        );
        assert_eq!(
            report.get(CanonicalField::ProductName),
            Some(&FieldResolution::Resolved { raw: "product_name".to_string(), via: MatchKind::Exact })
        );
        assert_eq!(report.resolved_count(), 3);
    }

    #[test]
    fn test_first_match_wins_and_loser_is_reported() {
        let report = resolve(&cols(&["金额", "金额(元)"]), ALIASES, FIELDS);
        assert_eq!(
            report.get(CanonicalField::Amount),
            Some(&FieldResolution::Resolved { raw: "金额".to_string(), via: MatchKind::Alias })
        );
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].ignored, "金额(元)");
    }

    #[test]
    fn test_raw_order_decides_between_canonical_name_and_alias() {
        let report = resolve(&cols(&["金额(元)", "amount"]), ALIASES, FIELDS);
        assert_eq!(
            report.get(CanonicalField::Amount),
            Some(&FieldResolution::Resolved { raw: "金额(元)".to_string(), via: MatchKind::Alias })
        );
        assert_eq!(report.conflicts[0].ignored, "amount");

        let report = resolve(&cols(&["amount", "金额(元)"]), ALIASES, FIELDS);
        assert_eq!(
            report.get(CanonicalField::Amount),
            Some(&FieldResolution::Resolved { raw: "amount".to_string(), via: MatchKind::Exact })
        );
    }

    #[test]
    fn test_wechat_aliases_keep_first_amount_column() {
        use crate::pipeline::processing::platforms::{PlatformProfile, WechatProfile};

        let report = resolve(&cols(&["金额", "金额(元)"]), WechatProfile::new().aliases(), &[CanonicalField::Amount]);
        assert_eq!(
            report.get(CanonicalField::Amount),
            Some(&FieldResolution::Resolved { raw: "金额".to_string(), via: MatchKind::Alias })
        );
    }

    #[test]
    fn test_substring_candidates_are_advisory() {
        let sink = MemoryDiagnostics::new();
        let reconciler = SchemaReconciler::new(Arc::new(sink.clone()));
        let mut records = RecordSet::new(cols(&["对方账户", "商品详情"]));

        let report = reconciler.reconcile(&mut records, ALIASES, FIELDS);

        assert_eq!(
            report.get(CanonicalField::ProductName),
            Some(&FieldResolution::Ambiguous { candidates: vec!["商品详情".to_string()] })
        );
        assert_eq!(report.get(CanonicalField::Counterparty), Some(&FieldResolution::Unresolved));
        // Nothing renamed
        assert_eq!(records.columns(), &["对方账户", "商品详情"]);
        assert!(sink.contains(DiagnosticKind::FieldAmbiguous));
        assert!(sink.contains(DiagnosticKind::FieldUnresolved));
    }

    #[test]
    fn test_reconcile_renames_and_never_maps_twice() {
        let sink = MemoryDiagnostics::new();
        let reconciler = SchemaReconciler::new(Arc::new(sink));
        let mut records = RecordSet::new(cols(&["交易对方", "金额(元)", "金额", "商品"]));

        let report = reconciler.reconcile(&mut records, ALIASES, FIELDS);

        assert_eq!(records.columns(), &["counterparty", "amount", "金额", "product_name"]);
        let raws: Vec<&str> = report
            .fields
            .iter()
            .filter_map(|f| match &f.resolution {
                FieldResolution::Resolved { raw, .. } => Some(raw.as_str()),
                _ => None,
            })
            .collect();
        let unique: HashSet<&str> = raws.iter().copied().collect();
        assert_eq!(raws.len(), unique.len());
    }

    #[test]
    fn test_reconcile_is_stable_on_canonical_columns() {
        let reconciler = SchemaReconciler::new(Arc::new(MemoryDiagnostics::new()));
        let mut records = RecordSet::new(cols(&["counterparty", "amount", "product_name"]));
        let report = reconciler.reconcile(&mut records, ALIASES, FIELDS);
        assert!(report
            .fields
            .iter()
            .all(|f| matches!(f.resolution, FieldResolution::Resolved { via: MatchKind::Exact, .. })));
    }
}
