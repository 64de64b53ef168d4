// src/config/mod.rs

//! Configuration loading for `runvisor`.
//!
//! - [`model`] holds the serde types mirroring `Runvisor.toml`.
//! - [`loader`] reads the file from disk.
//! - [`validate`] turns a raw file into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, PipelineConfig, RawConfigFile, ServerConfig};
