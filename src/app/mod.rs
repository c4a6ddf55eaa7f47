pub mod ports;
pub mod clean_use_case;
pub mod merge_use_case;
pub mod run_use_case;
