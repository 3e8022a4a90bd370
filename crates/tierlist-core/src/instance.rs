//! Placeable instances of catalog items.
//!
//! An original instance shares its id with the catalog item. A duplicate
//! carries a token that keeps it distinct from the original forever:
//!
//! ```text
//! xiao                 original
//! xiao#1718000000000   duplicate
//! ```

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::{Item, ItemId};

/// Distinguishing token of a duplicate (creation time in ms, made unique).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicateToken(pub u64);

impl DuplicateToken {
    /// No later token can follow this one.
    pub fn is_exhausted(self) -> bool {
        self.0 == u64::MAX
    }
}

/// Whether an instance is the catalog original or a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Original,
    Duplicate(DuplicateToken),
}

/// Globally unique id of a placeable instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId {
    pub base: ItemId,
    pub variant: Variant,
}

impl InstanceId {
    pub fn original(base: ItemId) -> Self {
        Self {
            base,
            variant: Variant::Original,
        }
    }

    pub fn duplicate(base: ItemId, token: DuplicateToken) -> Self {
        Self {
            base,
            variant: Variant::Duplicate(token),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self.variant, Variant::Duplicate(_))
    }

    pub fn token(&self) -> Option<DuplicateToken> {
        match self.variant {
            Variant::Original => None,
            Variant::Duplicate(token) => Some(token),
        }
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self::original(ItemId::new(s))
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant {
            Variant::Original => write!(f, "{}", self.base),
            Variant::Duplicate(token) => write!(f, "{}#{}", self.base, token.0),
        }
    }
}

/// Error parsing an instance id string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid instance id: {0:?}")]
pub struct ParseInstanceIdError(String);

impl FromStr for InstanceId {
    type Err = ParseInstanceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            None if !s.is_empty() => Ok(Self::original(ItemId::new(s))),
            Some((base, token)) if !base.is_empty() => token
                .parse::<u64>()
                .map(|t| Self::duplicate(ItemId::new(base), DuplicateToken(t)))
                .map_err(|_| ParseInstanceIdError(s.to_string())),
            _ => Err(ParseInstanceIdError(s.to_string())),
        }
    }
}

// Serialized in display form so ids can key JSON maps.
impl Serialize for InstanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Display identity owned by an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDisplay {
    pub name: String,
    pub icon: String,
    pub rarity: Option<u8>,
    pub element: Option<String>,
}

impl From<&Item> for ItemDisplay {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            icon: item.icon.clone(),
            rarity: item.rarity,
            element: item.element.clone(),
        }
    }
}

/// A placeable occurrence of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    pub display: ItemDisplay,
}

impl Instance {
    /// The original instance of a catalog item.
    pub fn original(item: &Item) -> Self {
        Self {
            id: InstanceId::original(item.id.clone()),
            display: ItemDisplay::from(item),
        }
    }
}

/// Source of duplicate tokens.
///
/// Tokens are wall-clock milliseconds, bumped so they strictly increase
/// even when several duplicates are made within the same millisecond.
#[derive(Debug, Default)]
pub struct DuplicateTokens {
    last: u64,
}

impl DuplicateTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> DuplicateToken {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        // Saturates; a repeated token is then refused as a duplicate id.
        self.last = now.max(self.last.saturating_add(1));
        DuplicateToken(self.last)
    }

    /// Ensure later tokens sort after one seen elsewhere (e.g. restored).
    pub fn observe(&mut self, token: DuplicateToken) {
        self.last = self.last.max(token.0);
    }
}
