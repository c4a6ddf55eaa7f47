pub mod diagnostics_adapter;
pub mod normalize_output_adapter;
