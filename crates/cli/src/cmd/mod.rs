//! CLI command implementations
//!
//! This module contains all command implementations for the preupload CLI.

pub mod config;
pub mod hooks;
pub mod run;
