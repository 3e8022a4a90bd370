//! Tier definitions and the default tier palette.

use serde::{Deserialize, Serialize};

const UNASSIGNED: &str = "unassigned";

/// Identifier of a tier bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved holding bucket for unclassified instances.
    pub fn unassigned() -> Self {
        Self(UNASSIGNED.to_string())
    }

    /// A fresh id for a tier added while editing.
    pub fn generate() -> Self {
        Self(format!("tier-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn is_unassigned(&self) -> bool {
        self.0 == UNASSIGNED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TierId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named rank in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDef {
    pub id: TierId,
    pub label: String,
    /// Hex color without `#`
    pub color: String,
}

impl TierDef {
    pub fn new(id: impl Into<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: TierId::new(id),
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Rank colors, hottest first.
pub const DEFAULT_TIER_COLORS: &[&str] = &[
    "FF7F7F", // SS
    "FFBF7F", // S
    "FFDF7F", // A
    "FFFF7F", // B
    "BFFF7F", // C
    "7FFF7F", // D
    "7FBFFF", // F
    "BF7FFF",
];

/// Color for the tier at `position`, cycling through the palette.
pub fn default_tier_color(position: usize) -> &'static str {
    DEFAULT_TIER_COLORS[position % DEFAULT_TIER_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_is_reserved() {
        assert!(TierId::unassigned().is_unassigned());
        assert!(!TierId::from("s").is_unassigned());
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = TierId::generate();
        let b = TierId::generate();
        assert_ne!(a, b);
        assert!(!a.is_unassigned());
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(default_tier_color(0), default_tier_color(DEFAULT_TIER_COLORS.len()));
    }
}
