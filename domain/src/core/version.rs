//! Tool version value objects
//!
//! [`ToolVersion`] is the resolved version of the terraform binary and
//! [`VersionConstraint`] is a half-open range (`>= min`, `< max`) attached to
//! operations and option slots.

use crate::core::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;

/// Semantic version of the terraform binary (Value Object)
///
/// Build metadata (`+...`) is discarded when parsing. A pre-release orders
/// before the corresponding release, so `0.15.0-beta1 < 0.15.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl ToolVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub fn with_pre(mut self, pre: impl Into<String>) -> Self {
        self.pre = Some(pre.into());
        self
    }

    /// Version with the pre-release tag stripped.
    pub fn core(&self) -> ToolVersion {
        ToolVersion::new(self.major, self.minor, self.patch)
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ToolVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidVersion(s.to_string());

        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let trimmed = trimmed.split('+').next().unwrap_or(trimmed);

        let (core, pre) = match trimmed.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(invalid()),
            None => (trimmed, None),
        };

        let mut parts = core.split('.');
        let mut next = || -> Result<u64, ParseError> {
            parts
                .next()
                .and_then(|p| p.parse::<u64>().ok())
                .ok_or_else(invalid)
        };
        let major = next()?;
        let minor = next()?;
        let patch = next()?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl Serialize for ToolVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ToolVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Allowed version range: `min` inclusive, `max` exclusive.
///
/// Comparisons use [`ToolVersion::core`] so that pre-releases of an allowed
/// release are accepted (`1.0.0-rc1` satisfies `>= 1.0.0`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionConstraint {
    pub min: Option<ToolVersion>,
    pub max: Option<ToolVersion>,
}

impl VersionConstraint {
    pub const fn at_least(min: ToolVersion) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub const fn below(max: ToolVersion) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub const fn between(min: ToolVersion, max: ToolVersion) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether `version` lies inside the range.
    pub fn allows(&self, version: &ToolVersion) -> bool {
        let core = version.core();
        if let Some(min) = &self.min
            && core < *min
        {
            return false;
        }
        if let Some(max) = &self.max
            && core >= *max
        {
            return false;
        }
        true
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, ">= {}, < {}", min, max),
            (Some(min), None) => write!(f, ">= {}", min),
            (None, Some(max)) => write!(f, "< {}", max),
            (None, None) => write!(f, "any version"),
        }
    }
}
