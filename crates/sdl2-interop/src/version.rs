//! SDL version numbers and version-keyed dispatch tables

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` SDL version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    /// Reported when the library cannot tell its own version
    pub const UNKNOWN: Version = Version::new(0, 0, 0);

    /// Version `major.minor.patch`
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl TryFrom<&semver::Version> for Version {
    type Error = Error;

    fn try_from(version: &semver::Version) -> Result<Self> {
        let component = |value: u64| {
            u8::try_from(value)
                .map_err(|_| Error::invalid_argument("a version component in 0..=255", value.to_string()))
        };

        Ok(Version::new(
            component(version.major)?,
            component(version.minor)?,
            component(version.patch)?,
        ))
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = semver::Version::parse(s.trim())
            .map_err(|e| Error::invalid_argument("a major.minor.patch version", format!("'{s}' ({e})")))?;
        Version::try_from(&parsed)
    }
}

/// Dispatch table selecting a strategy by library version
///
/// Entries are `(minimum version, strategy)` pairs in ascending order; the
/// entry with the highest minimum not above the running version wins.
#[derive(Debug)]
pub struct VersionTable<T: 'static> {
    entries: &'static [(Version, T)],
}

impl<T> VersionTable<T> {
    /// Table of `(minimum version, value)` entries in ascending order
    pub const fn new(entries: &'static [(Version, T)]) -> Self {
        Self { entries }
    }

    /// Strategy for `version`, or `None` when it predates every entry
    pub fn select(&self, version: Version) -> Option<&T> {
        self.entries
            .iter()
            .rev()
            .find(|(minimum, _)| *minimum <= version)
            .map(|(_, strategy)| strategy)
    }

    /// Oldest version the table supports
    pub fn minimum(&self) -> Option<Version> {
        self.entries.first().map(|(minimum, _)| *minimum)
    }
}
