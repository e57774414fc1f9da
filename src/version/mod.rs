//! Version handling for stateguard
//!
//! - `SemanticVersion`: parsing and ordering of `major.minor.patch` strings
//! - `VersionManager`: the version marker and the compatibility decision
//!
//! Two versions are compatible when they match exactly or share the same
//! major and minor. Anything else either migrates (stored version between
//! the configured floor and the running version) or is rejected.

mod manager;
mod semver;

pub use manager::{
    CompatibilityAction, CompatibilityResult, CompatibilityStatus, VersionManager,
};
pub use semver::SemanticVersion;
