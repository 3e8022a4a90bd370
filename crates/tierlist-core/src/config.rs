//! Configuration for tierlist-core
//!
//! Board limits and durable storage keys. Loaded from TOML:
//!
//! ```toml
//! [board]
//! default_column_count = 1
//! max_columns = 6
//!
//! [storage]
//! character_key = "tierlist.templates.character"
//! weapon_key = "tierlist.templates.weapon"
//! placements_prefix = "tierlist.placements"
//! directory = "/home/me/.local/share/tierlist"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::ItemKind;
use crate::error::{Result, TierListError};

/// System-wide configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierListConfig {
    /// Board limits
    pub board: BoardConfig,
    /// Durable storage settings
    pub storage: StorageConfig,
}

impl TierListConfig {
    /// Parse a configuration document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| TierListError::Config(e.to_string()))
    }

    /// Load from a file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Board limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Column count for templates that don't specify one
    pub default_column_count: usize,
    /// Upper bound for a template's column count
    pub max_columns: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_column_count: 1,
            max_columns: 6,
        }
    }
}

/// Durable storage keys and location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key holding custom character templates
    pub character_key: String,
    /// Key holding custom weapon templates
    pub weapon_key: String,
    /// Prefix for explicitly saved placement snapshots
    pub placements_prefix: String,
    /// Directory for the file-backed store
    pub directory: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            character_key: "tierlist.templates.character".to_string(),
            weapon_key: "tierlist.templates.weapon".to_string(),
            placements_prefix: "tierlist.placements".to_string(),
            directory: None,
        }
    }
}

impl StorageConfig {
    /// Key under which custom templates of `kind` are stored.
    pub fn templates_key(&self, kind: ItemKind) -> &str {
        match kind {
            ItemKind::Character => &self.character_key,
            ItemKind::Weapon => &self.weapon_key,
        }
    }

    /// Key under which placement snapshots of `kind` are stored.
    pub fn placements_key(&self, kind: ItemKind) -> String {
        format!("{}.{}", self.placements_prefix, kind.as_str())
    }
}
