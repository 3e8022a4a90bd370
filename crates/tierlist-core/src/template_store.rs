//! Template store: builtin and custom templates plus the active selection.
//!
//! Custom templates of one kind are persisted together under a single
//! storage key:
//!
//! ```json
//! { "version": 1, "templates": [ { "id": "custom-…", "name": "…", … } ] }
//! ```
//!
//! Storage failures never fail an operation. They are logged and reported
//! through the `persisted` flag; the in-memory list stays authoritative.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::ItemKind;
use crate::config::BoardConfig;
use crate::error::{StorageError, TemplateError};
use crate::storage::{read_json, write_json, KeyValueStore};
use crate::template::{
    builtin_templates, EditOutcome, Template, TemplateDraft, TemplateEdit, TemplateId,
};

/// Version number for the persisted template format
const TEMPLATES_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedTemplates {
    version: u32,
    templates: Vec<Template>,
}

/// Where a template comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    /// Compiled in, read-only
    Builtin,
    /// Created by the user, persisted
    Custom,
}

/// Result of `save_as`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: TemplateId,
    pub persisted: bool,
}

/// Result of `delete`
#[derive(Debug, Clone)]
pub struct Deleted {
    pub template: Template,
    pub was_active: bool,
    pub persisted: bool,
}

/// Result of `edit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edited {
    pub outcome: EditOutcome,
    pub persisted: bool,
}

/// Builtin and custom templates of one item kind.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    kind: ItemKind,
    key: String,
    default_columns: usize,
    max_columns: usize,
    builtins: Vec<Template>,
    customs: Vec<Template>,
    active: TemplateId,
}

impl TemplateStore {
    /// A store with builtins only; the first builtin is active.
    pub fn new(kind: ItemKind, key: impl Into<String>, limits: &BoardConfig) -> Self {
        let builtins = builtin_templates(kind);
        let active = builtins[0].id.clone();
        let max_columns = limits.max_columns.max(1);
        Self {
            kind,
            key: key.into(),
            default_columns: limits.default_column_count.clamp(1, max_columns),
            max_columns,
            builtins,
            customs: Vec::new(),
            active,
        }
    }

    /// Builtins plus the custom templates found in `storage`.
    ///
    /// Unreadable or corrupt data counts as "no custom templates".
    pub fn load(
        kind: ItemKind,
        key: impl Into<String>,
        limits: &BoardConfig,
        storage: &dyn KeyValueStore,
    ) -> Self {
        let mut store = Self::new(kind, key, limits);
        match store.read_customs(storage) {
            Ok(customs) => {
                debug!(kind = %kind, count = customs.len(), "loaded custom templates");
                store.customs = customs;
            }
            Err(e) => warn!(kind = %kind, key = %store.key, "ignoring stored templates: {}", e),
        }
        store
    }

    fn read_customs(&self, storage: &dyn KeyValueStore) -> Result<Vec<Template>, StorageError> {
        let Some(persisted) = read_json::<PersistedTemplates>(storage, &self.key)? else {
            return Ok(Vec::new());
        };
        if persisted.version != TEMPLATES_FORMAT_VERSION {
            return Err(StorageError::VersionMismatch {
                expected: TEMPLATES_FORMAT_VERSION,
                actual: persisted.version,
            });
        }

        let mut customs: Vec<Template> = Vec::with_capacity(persisted.templates.len());
        for mut template in persisted.templates {
            if template.kind != self.kind
                || template.tiers.is_empty()
                || template.tiers.iter().any(|t| t.id.is_unassigned())
                || self.builtins.iter().any(|b| b.id == template.id)
                || customs.iter().any(|c| c.id == template.id)
            {
                warn!(template = %template.id, "skipping unusable stored template");
                continue;
            }
            if template.column_count == 0 {
                template.column_count = self.default_columns;
            }
            template.column_count = template.column_count.min(self.max_columns);
            customs.push(template);
        }
        Ok(customs)
    }

    /// Write the custom list. Failures are logged, not returned.
    fn persist(&self, storage: &mut dyn KeyValueStore) -> bool {
        let persisted = PersistedTemplates {
            version: TEMPLATES_FORMAT_VERSION,
            templates: self.customs.clone(),
        };
        match write_json(storage, &self.key, &persisted) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, "failed to persist custom templates: {}", e);
                false
            }
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn max_columns(&self) -> usize {
        self.max_columns
    }

    pub fn active_id(&self) -> &TemplateId {
        &self.active
    }

    pub fn active(&self) -> &Template {
        self.get(&self.active).unwrap_or(&self.builtins[0])
    }

    pub fn get(&self, id: &TemplateId) -> Option<&Template> {
        self.builtins
            .iter()
            .chain(self.customs.iter())
            .find(|t| &t.id == id)
    }

    pub fn source(&self, id: &TemplateId) -> Option<TemplateSource> {
        if self.builtins.iter().any(|t| &t.id == id) {
            Some(TemplateSource::Builtin)
        } else if self.customs.iter().any(|t| &t.id == id) {
            Some(TemplateSource::Custom)
        } else {
            None
        }
    }

    /// Builtins first, then customs in creation order.
    pub fn all(&self) -> impl Iterator<Item = &Template> {
        self.builtins.iter().chain(self.customs.iter())
    }

    pub fn builtins(&self) -> &[Template] {
        &self.builtins
    }

    pub fn customs(&self) -> &[Template] {
        &self.customs
    }

    /// Make `id` the active template.
    pub fn select(&mut self, id: &TemplateId) -> Result<&Template, TemplateError> {
        if self.get(id).is_none() {
            return Err(TemplateError::NotFound(id.clone()));
        }
        self.active = id.clone();
        debug!(template = %id, "selected template");
        Ok(self.active())
    }

    /// Start an edit buffer cloned from any template.
    pub fn draft_from(
        &self,
        id: &TemplateId,
        name: impl Into<String>,
    ) -> Result<TemplateDraft, TemplateError> {
        self.get(id)
            .map(|t| TemplateDraft::from_template(t, name))
            .ok_or_else(|| TemplateError::NotFound(id.clone()))
    }

    /// Save a draft as a new custom template and persist the custom list.
    pub fn save_as(
        &mut self,
        draft: TemplateDraft,
        storage: &mut dyn KeyValueStore,
    ) -> Result<SaveOutcome, TemplateError> {
        let template = draft.template();
        if template.kind != self.kind {
            return Err(TemplateError::WrongKind {
                id: template.id.clone(),
                expected: self.kind,
                actual: template.kind,
            });
        }
        if template.column_count == 0 || template.column_count > self.max_columns {
            return Err(TemplateError::InvalidColumns {
                count: template.column_count,
                max: self.max_columns,
            });
        }

        let id = TemplateId::generate_custom();
        let template = draft.into_template(id.clone());
        info!(template = %id, name = %template.name, "saved custom template");
        self.customs.push(template);
        let persisted = self.persist(storage);
        Ok(SaveOutcome { id, persisted })
    }

    /// Delete a custom template. Deleting the active one re-selects the
    /// first builtin.
    pub fn delete(
        &mut self,
        id: &TemplateId,
        storage: &mut dyn KeyValueStore,
    ) -> Result<Deleted, TemplateError> {
        match self.source(id) {
            None => return Err(TemplateError::NotFound(id.clone())),
            Some(TemplateSource::Builtin) => {
                return Err(TemplateError::BuiltinImmutable(id.clone()))
            }
            Some(TemplateSource::Custom) => {}
        }
        let index = self
            .customs
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| TemplateError::NotFound(id.clone()))?;
        let template = self.customs.remove(index);

        let was_active = &self.active == id;
        if was_active {
            self.active = self.builtins[0].id.clone();
        }
        info!(template = %id, was_active, "deleted custom template");
        let persisted = self.persist(storage);
        Ok(Deleted {
            template,
            was_active,
            persisted,
        })
    }

    /// Apply an edit to a custom template and persist the custom list.
    pub fn edit(
        &mut self,
        id: &TemplateId,
        edit: &TemplateEdit,
        storage: &mut dyn KeyValueStore,
    ) -> Result<Edited, TemplateError> {
        if self.source(id) == Some(TemplateSource::Builtin) {
            return Err(TemplateError::BuiltinImmutable(id.clone()));
        }
        let max_columns = self.max_columns;
        let template = self
            .customs
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TemplateError::NotFound(id.clone()))?;
        let outcome = template.apply(edit, max_columns)?;
        if outcome == EditOutcome::Unchanged {
            return Ok(Edited {
                outcome,
                persisted: true,
            });
        }
        debug!(template = %id, ?outcome, "edited template");
        let persisted = self.persist(storage);
        Ok(Edited { outcome, persisted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::tier::TierId;

    const KEY: &str = "tierlist.templates.character";

    fn store() -> TemplateStore {
        TemplateStore::new(ItemKind::Character, KEY, &BoardConfig::default())
    }

    fn reload(kv: &MemoryStore) -> TemplateStore {
        TemplateStore::load(ItemKind::Character, KEY, &BoardConfig::default(), kv)
    }

    #[test]
    fn first_builtin_is_active() {
        let s = store();
        assert_eq!(s.active_id().as_str(), "standard");
        assert_eq!(s.source(s.active_id()), Some(TemplateSource::Builtin));
    }

    #[test]
    fn select_unknown_fails() {
        let mut s = store();
        let err = s.select(&TemplateId::from("nope")).unwrap_err();
        assert_eq!(err, TemplateError::NotFound(TemplateId::from("nope")));
        assert_eq!(s.active_id().as_str(), "standard");
    }

    #[test]
    fn save_as_persists() {
        let mut kv = MemoryStore::new();
        let mut s = store();
        let draft = s.draft_from(&TemplateId::from("roles"), "My roles").unwrap();
        let saved = s.save_as(draft, &mut kv).unwrap();
        assert!(saved.persisted);
        assert!(saved.id.as_str().starts_with("custom-"));
        assert_eq!(s.source(&saved.id), Some(TemplateSource::Custom));

        let reloaded = reload(&kv);
        assert_eq!(reloaded.customs(), s.customs());
    }

    #[test]
    fn builtins_are_immutable() {
        let mut kv = MemoryStore::new();
        let mut s = store();
        let standard = TemplateId::from("standard");
        assert_eq!(
            s.delete(&standard, &mut kv).unwrap_err(),
            TemplateError::BuiltinImmutable(standard.clone())
        );
        let edit = TemplateEdit::RenameTemplate { name: "x".into() };
        assert_eq!(
            s.edit(&standard, &edit, &mut kv).unwrap_err(),
            TemplateError::BuiltinImmutable(standard.clone())
        );
        assert_eq!(s.get(&standard).unwrap().name, "Standard");
        assert_eq!(kv.get(KEY).unwrap(), None);
    }

    #[test]
    fn delete_active_falls_back() {
        let mut kv = MemoryStore::new();
        let mut s = store();
        let draft = s.draft_from(&TemplateId::from("extended"), "Mine").unwrap();
        let id = s.save_as(draft, &mut kv).unwrap().id;
        s.select(&id).unwrap();

        let deleted = s.delete(&id, &mut kv).unwrap();
        assert!(deleted.was_active);
        assert_eq!(s.active_id().as_str(), "standard");
        assert!(s.customs().is_empty());
        assert!(reload(&kv).customs().is_empty());
    }

    #[test]
    fn edit_custom_persists() {
        let mut kv = MemoryStore::new();
        let mut s = store();
        let draft = s.draft_from(&TemplateId::from("standard"), "Mine").unwrap();
        let id = s.save_as(draft, &mut kv).unwrap().id;

        let edit = TemplateEdit::RenameTier {
            tier: TierId::from("s"),
            label: "Top".into(),
        };
        let edited = s.edit(&id, &edit, &mut kv).unwrap();
        assert_eq!(edited.outcome, EditOutcome::Cosmetic);

        let reloaded = reload(&kv);
        let tier = reloaded.get(&id).unwrap().tier(&TierId::from("s")).unwrap();
        assert_eq!(tier.label, "Top");
    }

    #[test]
    fn storage_failure_keeps_memory_state() {
        let mut kv = MemoryStore::with_quota(8);
        let mut s = store();
        let draft = s.draft_from(&TemplateId::from("standard"), "Mine").unwrap();
        let saved = s.save_as(draft, &mut kv).unwrap();
        assert!(!saved.persisted);
        assert!(s.get(&saved.id).is_some());
    }

    #[test]
    fn corrupt_storage_means_no_customs() {
        let mut kv = MemoryStore::new();
        kv.set(KEY, "{\"version\": 1, \"templates\": [").unwrap();
        let s = reload(&kv);
        assert!(s.customs().is_empty());
        assert_eq!(s.builtins().len(), 3);
    }

    #[test]
    fn version_mismatch_means_no_customs() {
        let mut kv = MemoryStore::new();
        kv.set(KEY, r#"{"version": 99, "templates": []}"#).unwrap();
        assert!(reload(&kv).customs().is_empty());
    }

    #[test]
    fn missing_column_count_uses_default() {
        let mut kv = MemoryStore::new();
        kv.set(
            KEY,
            r#"{"version": 1, "templates": [{"id": "custom-1", "name": "Old", "kind": "character",
                "tiers": [{"id": "s", "label": "S", "color": "FF7F7F"}]}]}"#,
        )
        .unwrap();
        let limits = BoardConfig {
            default_column_count: 2,
            max_columns: 6,
        };
        let s = TemplateStore::load(ItemKind::Character, KEY, &limits, &kv);
        assert_eq!(s.get(&TemplateId::from("custom-1")).unwrap().column_count, 2);
    }

    #[test]
    fn load_skips_foreign_kinds() {
        let mut kv = MemoryStore::new();
        let mut weapons = TemplateStore::new(ItemKind::Weapon, KEY, &BoardConfig::default());
        let draft = weapons.draft_from(&TemplateId::from("standard"), "Weapons").unwrap();
        weapons.save_as(draft, &mut kv).unwrap();

        let characters = reload(&kv);
        assert!(characters.customs().is_empty());
    }
}
