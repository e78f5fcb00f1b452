//! Batch orchestration
//!
//! Ties the input batch, mode selection, resume inspection, fetch drivers,
//! and output writers together into one sequential run.

mod config;
mod executor;
mod mode;

pub use config::{ProcessorOptions, DEFAULT_COMMIT_THRESHOLD};
pub use executor::{BatchSummary, PlatformSet, Processor};
pub use mode::{select_mode, RequestedMode};
