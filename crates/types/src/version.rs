//! Solution version parsing and ordering
//!
//! Solution packages carry dotted numeric versions with two to four
//! components (`1.0`, `2.1.3`, `9.0.2.1045`). Comparison is component-wise,
//! with missing trailing components treated as zero, so `2.0` and `2.0.0.0`
//! compare equal.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

const MIN_COMPONENTS: usize = 2;
const MAX_COMPONENTS: usize = 4;

/// Error returned when a version string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVersionError {
    #[error("empty version string")]
    Empty,

    #[error("version {input} must have between 2 and 4 components")]
    ComponentCount { input: String },

    #[error("invalid version component {component:?} in {input}")]
    InvalidComponent { input: String, component: String },
}

/// A comparable solution version
#[derive(Debug, Clone, Copy)]
pub struct SolutionVersion {
    parts: [u32; MAX_COMPONENTS],
    len: usize,
}

impl SolutionVersion {
    /// Build a three-component version
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            parts: [major, minor, patch, 0],
            len: 3,
        }
    }

    /// Build a four-component version
    #[must_use]
    pub const fn with_revision(major: u32, minor: u32, patch: u32, revision: u32) -> Self {
        Self {
            parts: [major, minor, patch, revision],
            len: 4,
        }
    }

    #[must_use]
    pub fn major(&self) -> u32 {
        self.parts[0]
    }

    #[must_use]
    pub fn minor(&self) -> u32 {
        self.parts[1]
    }

    /// Components as written
    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.parts[..self.len]
    }
}

impl FromStr for SolutionVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(ParseVersionError::Empty);
        }

        let pieces: Vec<&str> = input.split('.').collect();
        if !(MIN_COMPONENTS..=MAX_COMPONENTS).contains(&pieces.len()) {
            return Err(ParseVersionError::ComponentCount {
                input: input.to_string(),
            });
        }

        let mut parts = [0u32; MAX_COMPONENTS];
        for (slot, piece) in parts.iter_mut().zip(&pieces) {
            *slot = piece
                .parse::<u32>()
                .map_err(|_| ParseVersionError::InvalidComponent {
                    input: input.to_string(),
                    component: (*piece).to_string(),
                })?;
        }

        Ok(Self {
            parts,
            len: pieces.len(),
        })
    }
}

impl fmt::Display for SolutionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strs: Vec<String> = self.components().iter().map(ToString::to_string).collect();
        write!(f, "{}", strs.join("."))
    }
}

// Unused trailing slots are always zero, so comparing the padded arrays
// gives the zero-extension semantics.
impl PartialEq for SolutionVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for SolutionVersion {}

impl Hash for SolutionVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for SolutionVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SolutionVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl Serialize for SolutionVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SolutionVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display_keep_component_count() {
        let v: SolutionVersion = "9.0.2.1045".parse().unwrap();
        assert_eq!(v.components(), &[9, 0, 2, 1045]);
        assert_eq!(v.to_string(), "9.0.2.1045");

        let short: SolutionVersion = "2.1".parse().unwrap();
        assert_eq!(short.to_string(), "2.1");
    }

    #[test]
    fn test_missing_components_compare_as_zero() {
        let a: SolutionVersion = "2.0".parse().unwrap();
        let b: SolutionVersion = "2.0.0.0".parse().unwrap();
        assert_eq!(a, b);
        assert!(SolutionVersion::new(2, 0, 0) < SolutionVersion::with_revision(2, 0, 0, 1));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!("".parse::<SolutionVersion>(), Err(ParseVersionError::Empty));
        assert!(matches!(
            "1".parse::<SolutionVersion>(),
            Err(ParseVersionError::ComponentCount { .. })
        ));
        assert!(matches!(
            "1.2.3.4.5".parse::<SolutionVersion>(),
            Err(ParseVersionError::ComponentCount { .. })
        ));
        assert!(matches!(
            "1.x.0".parse::<SolutionVersion>(),
            Err(ParseVersionError::InvalidComponent { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_ordering_matches_tuple_ordering(
            a in proptest::array::uniform4(0u32..50),
            b in proptest::array::uniform4(0u32..50),
        ) {
            let va = SolutionVersion::with_revision(a[0], a[1], a[2], a[3]);
            let vb = SolutionVersion::with_revision(b[0], b[1], b[2], b[3]);
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }

        #[test]
        fn prop_display_roundtrips(parts in proptest::collection::vec(0u32..10_000, 2..=4)) {
            let text = parts.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
            let parsed: SolutionVersion = text.parse().unwrap();
            prop_assert_eq!(parsed.to_string(), text);
        }
    }
}
