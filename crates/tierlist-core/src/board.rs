//! The board: Assignment Table, Column Table and live instances.
//!
//! A `Board` is an immutable snapshot. Transitions clone it, change the
//! clone and hand back a new `Arc<Board>`, so a reader holding the previous
//! `Arc` never sees a half-applied move. A transition with nothing to do
//! hands back the same `Arc`.
//!
//! Invariants:
//! - every live instance sits in exactly one bucket, exactly once
//! - every live instance has a column entry; dead instances have none
//! - the `unassigned` bucket always exists

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{Catalog, ItemKind};
use crate::instance::{Instance, InstanceId};
use crate::tier::TierId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    kind: ItemKind,
    buckets: HashMap<TierId, Vec<InstanceId>>,
    columns: HashMap<InstanceId, usize>,
    instances: HashMap<InstanceId, Instance>,
}

impl Board {
    /// An empty board with only the `unassigned` bucket.
    pub fn empty(kind: ItemKind) -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(TierId::unassigned(), Vec::new());
        Self {
            kind,
            buckets,
            columns: HashMap::new(),
            instances: HashMap::new(),
        }
    }

    /// One original per catalog item, all in `unassigned` at column 0,
    /// plus an empty bucket for each tier.
    pub fn from_catalog<'a>(
        catalog: &Catalog,
        tiers: impl IntoIterator<Item = &'a TierId>,
    ) -> Self {
        let mut board = Self::empty(catalog.kind());
        for tier in tiers {
            board.bucket_mut(tier);
        }
        for item in catalog.items() {
            board.insert_instance(Instance::original(item), &TierId::unassigned(), None, 0);
        }
        board
    }

    /// Every live instance back in `unassigned` (column 0), with empty
    /// buckets for `tiers` only.
    ///
    /// Order in `unassigned`: its current contents, then the buckets named
    /// in `previous_order`, then any other bucket by id.
    pub fn reset<'a>(
        &self,
        previous_order: &[TierId],
        tiers: impl IntoIterator<Item = &'a TierId>,
    ) -> Self {
        let unassigned = TierId::unassigned();
        let mut order: Vec<&TierId> = vec![&unassigned];
        order.extend(previous_order.iter().filter(|t| !t.is_unassigned()));
        let mut rest: Vec<&TierId> = self
            .buckets
            .keys()
            .filter(|t| !order.contains(t))
            .collect();
        rest.sort();
        order.extend(rest);

        let mut pool = Vec::with_capacity(self.instances.len());
        for tier in order {
            if let Some(bucket) = self.buckets.get(tier) {
                pool.extend(bucket.iter().cloned());
            }
        }

        let mut buckets = HashMap::new();
        for tier in tiers {
            buckets.insert(tier.clone(), Vec::new());
        }
        let columns = pool.iter().map(|id| (id.clone(), 0)).collect();
        buckets.insert(unassigned, pool);

        Self {
            kind: self.kind,
            buckets,
            columns,
            instances: self.instances.clone(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Instances in a bucket, in order. Unknown buckets are empty.
    pub fn bucket(&self, tier: &TierId) -> &[InstanceId] {
        self.buckets.get(tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_bucket(&self, tier: &TierId) -> bool {
        self.buckets.contains_key(tier)
    }

    /// Ids of all buckets, including `unassigned`.
    pub fn tiers(&self) -> impl Iterator<Item = &TierId> {
        self.buckets.keys()
    }

    pub fn column_of(&self, id: &InstanceId) -> Option<usize> {
        self.columns.get(id).copied()
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// The bucket currently holding `id`.
    pub fn tier_of(&self, id: &InstanceId) -> Option<&TierId> {
        self.buckets
            .iter()
            .find(|(_, bucket)| bucket.contains(id))
            .map(|(tier, _)| tier)
    }

    /// Index of `id` within `tier`'s bucket.
    pub fn position(&self, tier: &TierId, id: &InstanceId) -> Option<usize> {
        self.buckets.get(tier)?.iter().position(|i| i == id)
    }

    /// Verify the partition and column invariants.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !self.buckets.contains_key(&TierId::unassigned()) {
            return Err("unassigned bucket missing".to_string());
        }
        let mut seen: HashMap<&InstanceId, &TierId> = HashMap::new();
        for (tier, bucket) in &self.buckets {
            for id in bucket {
                if !self.instances.contains_key(id) {
                    return Err(format!("{} in {} is not a live instance", id, tier));
                }
                if let Some(other) = seen.insert(id, tier) {
                    return Err(format!("{} appears in both {} and {}", id, other, tier));
                }
            }
        }
        if seen.len() != self.instances.len() {
            return Err(format!(
                "{} live instances but {} placed",
                self.instances.len(),
                seen.len()
            ));
        }
        if self.columns.len() != self.instances.len()
            || self.columns.keys().any(|id| !self.instances.contains_key(id))
        {
            return Err("column table out of sync with live instances".to_string());
        }
        let unassigned = TierId::unassigned();
        if let Some(id) = self
            .bucket(&unassigned)
            .iter()
            .find(|id| self.column_of(id) != Some(0))
        {
            return Err(format!("{} is unassigned but not in column 0", id));
        }
        Ok(())
    }

    // Mutators below are only applied to a private clone inside a transition.

    pub(crate) fn bucket_mut(&mut self, tier: &TierId) -> &mut Vec<InstanceId> {
        self.buckets.entry(tier.clone()).or_default()
    }

    /// Take `id` out of whichever bucket holds it.
    pub(crate) fn detach(&mut self, id: &InstanceId) -> Option<(TierId, usize)> {
        for (tier, bucket) in self.buckets.iter_mut() {
            if let Some(index) = bucket.iter().position(|i| i == id) {
                bucket.remove(index);
                return Some((tier.clone(), index));
            }
        }
        None
    }

    pub(crate) fn set_column(&mut self, id: &InstanceId, column: usize) {
        self.columns.insert(id.clone(), column);
    }

    /// Register a live instance at `index` in `tier` (end when `None`).
    pub(crate) fn insert_instance(
        &mut self,
        instance: Instance,
        tier: &TierId,
        index: Option<usize>,
        column: usize,
    ) {
        let id = instance.id.clone();
        let bucket = self.bucket_mut(tier);
        match index {
            Some(i) if i <= bucket.len() => bucket.insert(i, id.clone()),
            _ => bucket.push(id.clone()),
        }
        self.columns.insert(id.clone(), column);
        self.instances.insert(id, instance);
    }

    /// Erase an instance from every table.
    pub(crate) fn destroy_instance(&mut self, id: &InstanceId) -> Option<Instance> {
        self.detach(id);
        self.columns.remove(id);
        self.instances.remove(id)
    }

    pub(crate) fn instance_mut(&mut self, id: &InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id)
    }

    pub(crate) fn drop_bucket(&mut self, tier: &TierId) -> Vec<InstanceId> {
        if tier.is_unassigned() {
            return Vec::new();
        }
        self.buckets.remove(tier).unwrap_or_default()
    }
}

/// Add an empty bucket for a new tier. Existing buckets are left alone.
pub fn add_bucket(board: &Arc<Board>, tier: &TierId) -> Arc<Board> {
    if board.has_bucket(tier) {
        return Arc::clone(board);
    }
    let mut next = Board::clone(board);
    next.bucket_mut(tier);
    Arc::new(next)
}

/// Move every instance of `tier` to the end of `unassigned` (column 0) and
/// drop the bucket.
pub fn migrate_tier(board: &Arc<Board>, tier: &TierId) -> Arc<Board> {
    if tier.is_unassigned() || !board.has_bucket(tier) {
        return Arc::clone(board);
    }
    let mut next = Board::clone(board);
    let moved = next.drop_bucket(tier);
    for id in &moved {
        next.set_column(id, 0);
    }
    if !moved.is_empty() {
        tracing::debug!(tier = %tier, count = moved.len(), "migrated tier to unassigned");
    }
    next.bucket_mut(&TierId::unassigned()).extend(moved);
    Arc::new(next)
}

/// Rename one instance. Other instances of the same item keep their name.
pub fn rename_instance(
    board: &Arc<Board>,
    id: &InstanceId,
    name: &str,
) -> Result<Arc<Board>, crate::error::BoardError> {
    let current = board
        .instance(id)
        .ok_or_else(|| crate::error::BoardError::UnknownInstance(id.clone()))?;
    if current.display.name == name {
        return Ok(Arc::clone(board));
    }
    let mut next = Board::clone(board);
    if let Some(instance) = next.instance_mut(id) {
        instance.display.name = name.to_string();
    }
    Ok(Arc::new(next))
}
