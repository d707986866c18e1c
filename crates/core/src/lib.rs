//! Core types and utilities for preupload
//!
//! This is the foundation crate that all other preupload crates depend on.
//! It provides:
//! - The shared error type and `Result` alias
//! - Host platform detection (the `${BUILD_OS}` value)
//!
//! This crate has no dependencies on other preupload crates.

pub mod error;
pub mod platform;

pub use error::{Error, Result};
pub use platform::{BuildOs, CURRENT_PLATFORM, Platform};
