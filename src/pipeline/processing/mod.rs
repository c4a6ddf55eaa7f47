// Pipeline processing: schema reconciliation, field coercion, row hygiene

pub mod normalize;
pub mod platforms;
pub mod reconcile;
pub mod sanitize;

pub use normalize::{DirectionVocabulary, FieldNormalizer, NormalizationStats};
pub use reconcile::{FieldResolution, ReconciliationReport, SchemaReconciler};
pub use sanitize::{RowSanitizer, SanitizeStats};
