//! Configuration module for stateguard
//!
//! This module provides configuration management including:
//! - Project-relative path resolution
//! - Settings persistence

pub mod paths;
pub mod settings;

pub use paths::ProjectPaths;
pub use settings::Settings;
