//! Locator module: the candidate space of remote assets
//!
//! This module contains:
//! - `AssetKind`, the two image kinds every entity can carry
//! - `LocatorCandidate` and the `LocatorTemplate` that derives remote
//!   addresses and local storage keys
//! - Numeric id windows and keyword-triggered ranges
//! - The `CandidateGenerator`, which turns an entity into ordered probe batches

mod candidate;
mod generator;
mod ranges;

pub use candidate::{LocatorCandidate, LocatorTemplate};
pub use generator::{BatchTier, CandidateBatch, CandidateGenerator};
pub use ranges::{IdWindow, KeywordRange, RangeTable};

use std::fmt;

/// Kind of image asset attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// Main artwork (`{id}.webp`)
    Primary,
    /// Small icon (`{id}_icon.webp`)
    Icon,
}

impl AssetKind {
    /// All kinds in resolution order
    pub const ALL: [AssetKind; 2] = [AssetKind::Primary, AssetKind::Icon];

    /// File name suffix appended after the numeric id
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Primary => "",
            Self::Icon => "_icon",
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Icon => "icon",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "icon" => Some(Self::Icon),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_kind_db_round_trip() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::from_db_string(kind.to_db_string()), Some(kind));
        }
        assert_eq!(AssetKind::from_db_string("banner"), None);
    }

    #[test]
    fn test_asset_kind_suffix() {
        assert_eq!(AssetKind::Primary.suffix(), "");
        assert_eq!(AssetKind::Icon.suffix(), "_icon");
    }
}
