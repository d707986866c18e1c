//! Configuration management for preupload
//!
//! This crate handles:
//! - Parsing `PREUPLOAD.cfg` / `GLOBAL-PREUPLOAD.cfg` documents
//! - Merging the global and project-local documents into one policy
//! - Locating config files for a project
//! - Logging initialization

pub mod loader;
pub mod logging;
pub mod parser;
pub mod policy;

// Re-export error types from core
pub use preupload_core::{Error, Result};

// Re-export main types
pub use loader::{ConfigLoader, GLOBAL_FILENAME, LOCAL_FILENAME};
pub use parser::{ConfigDocument, Section};
pub use policy::{EffectivePolicy, OPTION_IGNORE_MERGED_COMMITS};
