//! Semantic version parsing
//!
//! Accepts `MAJOR.MINOR.PATCH`, optionally prefixed with `v` and optionally
//! followed by `-prerelease`. The prerelease tag is kept for display but
//! takes no part in equality or ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GuardError;

/// A `major.minor.patch` triple
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Text after the first `-`, if any
    pub prerelease: Option<String>,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// The version assumed for projects that predate the version marker
    pub fn legacy() -> Self {
        Self::new(0, 0, 0)
    }

    /// `(major, minor)` pair, the unit of compatibility
    pub fn major_minor(&self) -> (u64, u64) {
        (self.major, self.minor)
    }

    /// Same major and minor; patch differences never matter
    pub fn same_series(&self, other: &SemanticVersion) -> bool {
        self.major_minor() == other.major_minor()
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = GuardError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| GuardError::VersionParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let unprefixed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let (core, prerelease) = match unprefixed.split_once('-') {
            Some((_, "")) => return Err(fail("prerelease suffix after '-' is empty")),
            Some((core, rest)) => (core, Some(rest.to_string())),
            None => (unprefixed, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(fail("expected MAJOR.MINOR.PATCH"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail("components must be non-negative integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| fail("component is out of range"))?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            prerelease,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
