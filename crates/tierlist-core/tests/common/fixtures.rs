//! Shared catalogs and sessions for integration tests

use std::path::PathBuf;

use tierlist_core::{
    Catalog, Item, ItemKind, KeyValueStore, MemoryStore, TierListConfig, TierListSession,
};

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// The five-character catalog from `test_fixtures/characters.json`
#[allow(dead_code)]
pub fn character_catalog() -> Catalog {
    let json = std::fs::read_to_string(fixture_path("characters.json"))
        .unwrap_or_else(|_| panic!("Failed to load fixture: characters.json"));
    Catalog::from_json(ItemKind::Character, &json).unwrap()
}

/// Items `A`, `B`, `C`
#[allow(dead_code)]
pub fn abc_catalog() -> Catalog {
    Catalog::new(
        ItemKind::Character,
        ["A", "B", "C"]
            .iter()
            .map(|id| Item::new(*id, ItemKind::Character, *id))
            .collect(),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn session_with(catalog: Catalog, storage: Box<dyn KeyValueStore>) -> TierListSession {
    TierListSession::new(TierListConfig::default(), catalog, storage)
}

#[allow(dead_code)]
pub fn abc_session() -> TierListSession {
    session_with(abc_catalog(), Box::new(MemoryStore::new()))
}
