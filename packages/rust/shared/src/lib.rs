//! Shared types, error model, and configuration for legisharvest.
//!
//! This crate is the foundation depended on by all other legisharvest crates.
//! It provides:
//! - [`HarvestError`]: the unified error type
//! - Domain types ([`RecordId`], [`HearingRecord`], [`RosterRecord`], [`IndexBatch`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, HarvestConfig, IndexesConfig, SourcesConfig, StorageConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HarvestError, Result};
pub use types::{
    CHECKPOINT_DOCUMENT, CONGRESS_NUMBER_KEY, Chamber, HearingRecord, IndexBatch, IndexOp,
    RecordId, RosterKind, RosterRecord,
};
