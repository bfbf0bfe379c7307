//! Shared types, error model, and configuration for Atlas.
//!
//! This crate is the foundation depended on by all other Atlas crates.
//! It provides:
//! - [`AtlasError`] — the unified error type
//! - Domain types ([`TranscriptFragment`], [`Section`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, NotionConfig, OpenAiConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_secret,
};
pub use error::{AtlasError, Result};
pub use types::{Section, TranscriptFragment};
