pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod report;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;

pub use config::Config;
pub use domain::{CanonicalField, Cell, Direction, Platform, RecordSet};
pub use error::{BillError, Result};
