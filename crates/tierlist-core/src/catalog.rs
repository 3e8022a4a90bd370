//! Item catalog: the immutable pool of classifiable items.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result, TierListError};

/// Category of classifiable item. Each kind has its own grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Character,
    Weapon,
}

impl ItemKind {
    /// Lowercase name used in storage keys and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Weapon => "weapon",
        }
    }

    /// Parse from a name, accepting a few plural/short forms.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "character" | "characters" | "char" | "c" => Some(Self::Character),
            "weapon" | "weapons" | "w" => Some(Self::Weapon),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable catalog key of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A classifiable game entity, as supplied by the reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    /// Image reference for the item's tile
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rarity: Option<u8>,
    #[serde(default)]
    pub element: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, kind: ItemKind, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            icon: format!("{}.png", id),
            id: ItemId(id),
            kind,
            name: name.into(),
            rarity: None,
            element: None,
        }
    }

    pub fn with_rarity(mut self, rarity: u8) -> Self {
        self.rarity = Some(rarity);
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

/// Ordered, read-only list of items of a single kind.
#[derive(Debug, Clone)]
pub struct Catalog {
    kind: ItemKind,
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting repeated ids and items of another kind.
    ///
    /// `#` is reserved as the duplicate separator in instance ids.
    pub fn new(kind: ItemKind, items: Vec<Item>) -> Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if item.id.as_str().is_empty() || item.id.as_str().contains('#') {
                return Err(TierListError::Catalog(format!(
                    "invalid item id {:?}",
                    item.id.as_str()
                )));
            }
            if item.kind != kind {
                return Err(BoardError::WrongKind {
                    expected: kind,
                    actual: item.kind,
                }
                .into());
            }
            if index.insert(item.id.clone(), i).is_some() {
                return Err(TierListError::Catalog(format!(
                    "item id {} appears more than once",
                    item.id
                )));
            }
        }
        Ok(Self { kind, items, index })
    }

    /// Parse a JSON array of items.
    pub fn from_json(kind: ItemKind, json: &str) -> Result<Self> {
        let items: Vec<Item> = serde_json::from_str(json)?;
        Self::new(kind, items)
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Items in catalog order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_repeated_ids() {
        let items = vec![
            Item::new("hu_tao", ItemKind::Character, "Hu Tao"),
            Item::new("hu_tao", ItemKind::Character, "Hu Tao"),
        ];
        assert!(Catalog::new(ItemKind::Character, items).is_err());
    }

    #[test]
    fn rejects_wrong_kind() {
        let items = vec![Item::new("wolfs_gravestone", ItemKind::Weapon, "Wolf's Gravestone")];
        assert!(Catalog::new(ItemKind::Character, items).is_err());
    }

    #[test]
    fn rejects_reserved_separator() {
        let items = vec![Item::new("a#1", ItemKind::Character, "A")];
        assert!(Catalog::new(ItemKind::Character, items).is_err());
    }

    #[test]
    fn from_json_keeps_order() {
        let json = r#"[
            {"id": "xiao", "kind": "character", "name": "Xiao", "rarity": 5},
            {"id": "bennett", "kind": "character", "name": "Bennett"}
        ]"#;
        let catalog = Catalog::from_json(ItemKind::Character, json).unwrap();
        let ids: Vec<&str> = catalog.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["xiao", "bennett"]);
        assert_eq!(catalog.get(&ItemId::from("xiao")).unwrap().rarity, Some(5));
    }

    #[test]
    fn kind_parse() {
        assert_eq!(ItemKind::parse("Weapons"), Some(ItemKind::Weapon));
        assert_eq!(ItemKind::parse("c"), Some(ItemKind::Character));
        assert_eq!(ItemKind::parse("artifact"), None);
    }
}
