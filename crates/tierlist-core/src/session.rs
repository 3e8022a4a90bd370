//! Tier list session: the context object a page works against.
//!
//! A session owns the catalog, the template store, the storage backend and
//! the current board snapshot for one item kind. Every mutation replaces
//! `board` with a single assignment.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::{add_bucket, migrate_tier, rename_instance, Board};
use crate::catalog::{Catalog, ItemKind};
use crate::config::TierListConfig;
use crate::error::{BoardError, Result};
use crate::instance::{DuplicateToken, DuplicateTokens, Instance, InstanceId, ItemDisplay};
use crate::instances::{self, Removal};
use crate::query::PoolQuery;
use crate::storage::{read_json, write_json, KeyValueStore};
use crate::template::{EditOutcome, Template, TemplateDraft, TemplateEdit, TemplateId};
use crate::template_store::{Deleted, SaveOutcome, TemplateStore};
use crate::tier::TierId;
use crate::transfer::{self, DropEvent, DropTarget, TransferRequest};

/// What happened to a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropOutcome {
    /// The board changed
    Applied,
    /// Already at the target
    Unchanged,
    /// Kind mismatch; nothing happened
    Ignored,
}

/// Per-instance operations handed to views.
pub trait InstanceActions {
    /// Move an instance to another column of its current tier.
    fn change_column(&mut self, id: &InstanceId, column: usize) -> Result<bool>;

    /// Duplicate `source` next to itself within `within`.
    fn duplicate(&mut self, source: &InstanceId, within: &TierId) -> Result<InstanceId>;

    /// Recycle an original, destroy a duplicate.
    fn remove(&mut self, id: &InstanceId) -> Result<Removal>;
}

/// Explicitly saved placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSnapshot {
    pub template: TemplateId,
    pub buckets: HashMap<TierId, Vec<InstanceId>>,
    pub columns: HashMap<InstanceId, usize>,
    /// Displays of live duplicates
    #[serde(default)]
    pub duplicates: HashMap<InstanceId, ItemDisplay>,
}

impl PlacementSnapshot {
    fn capture(board: &Board, template: &Template) -> Self {
        let unassigned = TierId::unassigned();
        let buckets = std::iter::once(&unassigned)
            .chain(template.tiers.iter().map(|t| &t.id))
            .map(|tier| (tier.clone(), board.bucket(tier).to_vec()))
            .collect();
        let columns = board
            .instances()
            .filter_map(|i| board.column_of(&i.id).map(|c| (i.id.clone(), c)))
            .collect();
        let duplicates = board
            .instances()
            .filter(|i| i.id.is_duplicate())
            .map(|i| (i.id.clone(), i.display.clone()))
            .collect();
        Self {
            template: template.id.clone(),
            buckets,
            columns,
            duplicates,
        }
    }
}

/// Tier list state for one item kind.
pub struct TierListSession {
    config: TierListConfig,
    catalog: Catalog,
    templates: TemplateStore,
    storage: Box<dyn KeyValueStore>,
    board: Arc<Board>,
    tokens: DuplicateTokens,
}

impl std::fmt::Debug for TierListSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierListSession")
            .field("kind", &self.catalog.kind())
            .field("active_template", self.templates.active_id())
            .field("instances", &self.board.instance_count())
            .finish()
    }
}

impl TierListSession {
    /// Load custom templates from `storage` and lay out a fresh board for
    /// the first builtin template.
    pub fn new(config: TierListConfig, catalog: Catalog, storage: Box<dyn KeyValueStore>) -> Self {
        let kind = catalog.kind();
        let templates = TemplateStore::load(
            kind,
            config.storage.templates_key(kind),
            &config.board,
            storage.as_ref(),
        );
        let board = Arc::new(Board::from_catalog(
            &catalog,
            templates.active().tiers.iter().map(|t| &t.id),
        ));
        debug!(kind = %kind, items = catalog.len(), "session started");
        Self {
            config,
            catalog,
            templates,
            storage,
            board,
            tokens: DuplicateTokens::new(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.catalog.kind()
    }

    pub fn config(&self) -> &TierListConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn active_template(&self) -> &Template {
        self.templates.active()
    }

    /// The current snapshot. Holders keep a consistent view across later
    /// mutations.
    pub fn board(&self) -> Arc<Board> {
        Arc::clone(&self.board)
    }

    // ===== Board operations =====

    fn check_target(&self, tier: &TierId, column: usize) -> std::result::Result<(), BoardError> {
        if tier.is_unassigned() {
            return Ok(());
        }
        let template = self.templates.active();
        if !template.has_tier(tier) {
            return Err(BoardError::UnknownTier(tier.clone()));
        }
        if column >= template.column_count {
            return Err(BoardError::InvalidColumn {
                column,
                column_count: template.column_count,
            });
        }
        Ok(())
    }

    /// Move an instance. Returns whether the board changed.
    pub fn transfer(&mut self, request: &TransferRequest) -> Result<bool> {
        self.check_target(&request.tier, request.column)?;
        let next = transfer::transfer(&self.board, request)?;
        let changed = !Arc::ptr_eq(&next, &self.board);
        self.board = next;
        Ok(changed)
    }

    /// Entry point for drag gestures.
    pub fn handle_drop(&mut self, event: &DropEvent, target: &DropTarget) -> Result<DropOutcome> {
        if !target.accepts(event) || target.kind != self.kind() {
            debug!(
                instance = %event.instance,
                from = %event.kind,
                to = %target.kind,
                "ignored cross-kind drop"
            );
            return Ok(DropOutcome::Ignored);
        }
        if self.transfer(&target.request_for(event))? {
            Ok(DropOutcome::Applied)
        } else {
            Ok(DropOutcome::Unchanged)
        }
    }

    pub fn duplicate(&mut self, source: &InstanceId, within: &TierId) -> Result<InstanceId> {
        self.check_target(within, 0)?;
        let token = self.tokens.next();
        let duplicated = instances::duplicate(&self.board, source, within, token)?;
        self.board = duplicated.board;
        Ok(duplicated.id)
    }

    pub fn remove(&mut self, id: &InstanceId) -> Result<Removal> {
        let (next, removal) = instances::remove(&self.board, id)?;
        self.board = next;
        Ok(removal)
    }

    /// Move an instance to `column` within its current tier.
    pub fn change_column(&mut self, id: &InstanceId, column: usize) -> Result<bool> {
        let tier = self
            .board
            .tier_of(id)
            .cloned()
            .ok_or_else(|| BoardError::UnknownInstance(id.clone()))?;
        self.transfer(&TransferRequest::new(id.clone(), tier, column))
    }

    pub fn rename_instance(&mut self, id: &InstanceId, name: &str) -> Result<()> {
        self.board = rename_instance(&self.board, id, name)?;
        Ok(())
    }

    /// Instances of `tier` grouped by column of the active template.
    pub fn columns_for(&self, tier: &TierId) -> Vec<Vec<InstanceId>> {
        let count = if tier.is_unassigned() {
            1
        } else {
            self.templates.active().column_count
        };
        transfer::columns_for(&self.board, tier, count)
    }

    /// Unassigned instances matching `query`, in bucket order.
    pub fn pool(&self, query: &PoolQuery) -> Vec<&Instance> {
        self.board
            .bucket(&TierId::unassigned())
            .iter()
            .filter_map(|id| self.board.instance(id))
            .filter(|i| query.matches(&i.display))
            .collect()
    }

    // ===== Template operations =====

    /// Switch templates. All placements are reset.
    pub fn select_template(&mut self, id: &TemplateId) -> Result<()> {
        let previous = self.templates.active().tier_ids();
        let template = self.templates.select(id)?;
        self.board = Arc::new(self.board.reset(&previous, template.tiers.iter().map(|t| &t.id)));
        Ok(())
    }

    pub fn draft_from(&self, id: &TemplateId, name: impl Into<String>) -> Result<TemplateDraft> {
        Ok(self.templates.draft_from(id, name)?)
    }

    pub fn save_as_template(&mut self, draft: TemplateDraft) -> Result<SaveOutcome> {
        Ok(self.templates.save_as(draft, self.storage.as_mut())?)
    }

    /// Delete a custom template. If it was active its instances go back to
    /// `unassigned` and the board is rebuilt for the fallback.
    pub fn delete_template(&mut self, id: &TemplateId) -> Result<Deleted> {
        let deleted = self.templates.delete(id, self.storage.as_mut())?;
        if deleted.was_active {
            let order = deleted.template.tier_ids();
            let mut board = Arc::clone(&self.board);
            for tier in &order {
                board = migrate_tier(&board, tier);
            }
            let fallback = self.templates.active();
            self.board = Arc::new(board.reset(&order, fallback.tiers.iter().map(|t| &t.id)));
            info!(fallback = %fallback.id, "active template deleted, board rebuilt");
        }
        Ok(deleted)
    }

    /// Edit a custom template. Edits to the active one are reflected on the
    /// board.
    pub fn edit_template(&mut self, id: &TemplateId, edit: &TemplateEdit) -> Result<EditOutcome> {
        let edited = self.templates.edit(id, edit, self.storage.as_mut())?;
        if self.templates.active_id() == id {
            match &edited.outcome {
                EditOutcome::TierAdded(tier) => self.board = add_bucket(&self.board, tier),
                EditOutcome::TierRemoved(tier) => self.board = migrate_tier(&self.board, tier),
                _ => {}
            }
        }
        Ok(edited.outcome)
    }

    pub fn edit_active_template(&mut self, edit: &TemplateEdit) -> Result<EditOutcome> {
        let id = self.templates.active_id().clone();
        self.edit_template(&id, edit)
    }

    // ===== Placement snapshots =====

    fn placements_key(&self) -> String {
        self.config.storage.placements_key(self.kind())
    }

    pub fn save_placements(&mut self) -> Result<()> {
        let snapshot = PlacementSnapshot::capture(&self.board, self.templates.active());
        let key = self.placements_key();
        write_json(self.storage.as_mut(), &key, &snapshot)?;
        debug!(key = %key, "saved placements");
        Ok(())
    }

    /// Rebuild the board from the saved snapshot, if any. Returns whether
    /// one was applied.
    pub fn restore_placements(&mut self) -> Result<bool> {
        let key = self.placements_key();
        let snapshot = match read_json::<PlacementSnapshot>(self.storage.as_ref(), &key) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(key = %key, "ignoring saved placements: {}", e);
                return Ok(false);
            }
        };

        if self.templates.get(&snapshot.template).is_some() {
            self.templates.select(&snapshot.template)?;
        } else {
            warn!(template = %snapshot.template, "saved placements refer to an unknown template");
        }
        let (board, newest) = self.rebuild(&snapshot);
        if let Some(token) = newest {
            self.tokens.observe(token);
        }
        self.board = Arc::new(board);
        Ok(true)
    }

    /// Lay out a board for the active template from a snapshot. Also
    /// returns the newest duplicate token placed.
    fn rebuild(&self, snapshot: &PlacementSnapshot) -> (Board, Option<DuplicateToken>) {
        let template = self.templates.active();
        let unassigned = TierId::unassigned();
        let mut board = Board::empty(self.catalog.kind());
        for tier in template.tiers.iter().map(|t| &t.id) {
            board.bucket_mut(tier);
        }

        let mut placed: HashSet<InstanceId> = HashSet::new();
        let mut newest: Option<DuplicateToken> = None;
        let mut strays: Vec<InstanceId> = Vec::new();
        let mut tiers: Vec<&TierId> = vec![&unassigned];
        tiers.extend(template.tiers.iter().map(|t| &t.id));
        let mut others: Vec<&TierId> = snapshot
            .buckets
            .keys()
            .filter(|t| !tiers.contains(t))
            .collect();
        others.sort();

        for tier in tiers.iter().chain(others.iter()) {
            let known = tier.is_unassigned() || template.has_tier(tier);
            for id in snapshot.buckets.get(*tier).into_iter().flatten() {
                if placed.contains(id) {
                    continue;
                }
                if id.token().is_some_and(|t| t.is_exhausted()) {
                    warn!(instance = %id, "dropping saved duplicate with exhausted token");
                    continue;
                }
                let Some(instance) = self.resolve(id, snapshot) else {
                    debug!(instance = %id, "dropping unknown instance from saved placements");
                    continue;
                };
                placed.insert(id.clone());
                if !known {
                    strays.push(id.clone());
                    continue;
                }
                let column = snapshot.columns.get(id).copied().unwrap_or(0);
                let column = if tier.is_unassigned() || column >= template.column_count {
                    0
                } else {
                    column
                };
                newest = newest.max(id.token());
                board.insert_instance(instance, tier, None, column);
            }
        }

        // Instances of dropped tiers, then originals the snapshot never saw.
        for id in strays {
            if let Some(instance) = self.resolve(&id, snapshot) {
                newest = newest.max(id.token());
                board.insert_instance(instance, &unassigned, None, 0);
            }
        }
        for item in self.catalog.items() {
            let id = InstanceId::original(item.id.clone());
            if !placed.contains(&id) {
                board.insert_instance(Instance::original(item), &unassigned, None, 0);
            }
        }
        (board, newest)
    }

    fn resolve(&self, id: &InstanceId, snapshot: &PlacementSnapshot) -> Option<Instance> {
        let item = self.catalog.get(&id.base)?;
        let display = if id.is_duplicate() {
            snapshot
                .duplicates
                .get(id)
                .cloned()
                .unwrap_or_else(|| ItemDisplay::from(item))
        } else {
            ItemDisplay::from(item)
        };
        Some(Instance {
            id: id.clone(),
            display,
        })
    }
}

impl InstanceActions for TierListSession {
    fn change_column(&mut self, id: &InstanceId, column: usize) -> Result<bool> {
        TierListSession::change_column(self, id, column)
    }

    fn duplicate(&mut self, source: &InstanceId, within: &TierId) -> Result<InstanceId> {
        TierListSession::duplicate(self, source, within)
    }

    fn remove(&mut self, id: &InstanceId) -> Result<Removal> {
        TierListSession::remove(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;
    use crate::error::TierListError;
    use crate::storage::MemoryStore;

    fn session() -> TierListSession {
        let catalog = Catalog::new(
            ItemKind::Character,
            vec![
                Item::new("a", ItemKind::Character, "Amber"),
                Item::new("b", ItemKind::Character, "Bennett"),
                Item::new("c", ItemKind::Character, "Chongyun"),
            ],
        )
        .unwrap();
        TierListSession::new(TierListConfig::default(), catalog, Box::new(MemoryStore::new()))
    }

    fn id(s: &str) -> InstanceId {
        InstanceId::from(s)
    }

    #[test]
    fn starts_on_first_builtin() {
        let s = session();
        assert_eq!(s.active_template().id.as_str(), "standard");
        assert_eq!(s.board().bucket(&TierId::unassigned()).len(), 3);
        assert!(s.board().has_bucket(&TierId::from("s")));
    }

    #[test]
    fn transfer_validates_target() {
        let mut s = session();
        let err = s
            .transfer(&TransferRequest::new(id("a"), TierId::from("ss"), 0))
            .unwrap_err();
        assert!(matches!(err, TierListError::Board(BoardError::UnknownTier(_))));

        let err = s
            .transfer(&TransferRequest::new(id("a"), TierId::from("s"), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            TierListError::Board(BoardError::InvalidColumn { column: 1, column_count: 1 })
        ));
    }

    #[test]
    fn drop_outcomes() {
        let mut s = session();
        let event = DropEvent {
            instance: id("a"),
            kind: ItemKind::Character,
        };
        let target = DropTarget {
            kind: ItemKind::Character,
            tier: TierId::from("s"),
            column: 0,
        };
        assert_eq!(s.handle_drop(&event, &target).unwrap(), DropOutcome::Applied);
        let before = s.board();
        assert_eq!(s.handle_drop(&event, &target).unwrap(), DropOutcome::Unchanged);
        assert!(Arc::ptr_eq(&before, &s.board()));

        let weapon_target = DropTarget {
            kind: ItemKind::Weapon,
            ..target
        };
        assert_eq!(s.handle_drop(&event, &weapon_target).unwrap(), DropOutcome::Ignored);
    }

    #[test]
    fn actions_through_trait_object() {
        let mut s = session();
        s.select_template(&TemplateId::from("roles")).unwrap();
        s.transfer(&TransferRequest::new(id("a"), TierId::from("s"), 0)).unwrap();

        let actions: &mut dyn InstanceActions = &mut s;
        assert!(actions.change_column(&id("a"), 2).unwrap());
        let copy = actions.duplicate(&id("a"), &TierId::from("s")).unwrap();
        assert_eq!(actions.remove(&copy).unwrap(), Removal::Destroyed);

        assert_eq!(s.board().column_of(&id("a")), Some(2));
        s.board().check_invariants().unwrap();
    }

    #[test]
    fn cosmetic_edit_keeps_board() {
        let mut s = session();
        let draft = s.draft_from(&TemplateId::from("standard"), "Mine").unwrap();
        let saved = s.save_as_template(draft).unwrap();
        s.select_template(&saved.id).unwrap();
        s.transfer(&TransferRequest::new(id("a"), TierId::from("s"), 0)).unwrap();

        let before = s.board();
        let outcome = s
            .edit_active_template(&TemplateEdit::Recolor {
                tier: TierId::from("s"),
                color: "000000".into(),
            })
            .unwrap();
        assert_eq!(outcome, EditOutcome::Cosmetic);
        assert!(Arc::ptr_eq(&before, &s.board()));
    }

    #[test]
    fn pool_filters_unassigned() {
        let mut s = session();
        s.transfer(&TransferRequest::new(id("a"), TierId::from("s"), 0)).unwrap();
        let all = s.pool(&PoolQuery::default());
        assert_eq!(all.len(), 2);
        let query = crate::query::parse_pool_query("ben");
        let hits: Vec<&str> = s.pool(&query).iter().map(|i| i.display.name.as_str()).collect();
        assert_eq!(hits, vec!["Bennett"]);
    }

    #[test]
    fn placements_round_trip() {
        let mut s = session();
        s.select_template(&TemplateId::from("roles")).unwrap();
        s.transfer(&TransferRequest::new(id("a"), TierId::from("s"), 1)).unwrap();
        let copy = s.duplicate(&id("a"), &TierId::from("s")).unwrap();
        s.rename_instance(&copy, "Amber (alt)").unwrap();
        s.save_placements().unwrap();
        let saved = s.board();

        s.select_template(&TemplateId::from("standard")).unwrap();
        assert!(s.restore_placements().unwrap());
        assert_eq!(s.active_template().id.as_str(), "roles");
        assert_eq!(*s.board(), *saved);

        // tokens keep increasing past restored duplicates
        let next = s.duplicate(&id("a"), &TierId::from("s")).unwrap();
        assert!(next.token() > copy.token());
    }

    #[test]
    fn corrupt_placements_are_ignored() {
        let mut store = MemoryStore::new();
        store.set("tierlist.placements.character", "{oops").unwrap();
        let amber = Item::new("a", ItemKind::Character, "Amber");
        let catalog = Catalog::new(ItemKind::Character, vec![amber]).unwrap();
        let mut s = TierListSession::new(TierListConfig::default(), catalog, Box::new(store));
        let before = s.board();
        assert!(!s.restore_placements().unwrap());
        assert!(Arc::ptr_eq(&before, &s.board()));
    }
}
