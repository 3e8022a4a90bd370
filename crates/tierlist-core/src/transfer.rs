//! Transfer engine: moves instances between tier/column locations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::catalog::ItemKind;
use crate::error::BoardError;
use crate::instance::InstanceId;
use crate::tier::TierId;

/// Move `instance` to the end of `tier`, at `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub instance: InstanceId,
    pub tier: TierId,
    #[serde(default)]
    pub column: usize,
}

impl TransferRequest {
    pub fn new(instance: InstanceId, tier: TierId, column: usize) -> Self {
        Self {
            instance,
            tier,
            column,
        }
    }
}

/// Apply a transfer, producing a new board.
///
/// Returns the same `Arc` when the instance already sits in the target
/// tier and column. Moves into `unassigned` always land in column 0.
pub fn transfer(board: &Arc<Board>, req: &TransferRequest) -> Result<Arc<Board>, BoardError> {
    let current = board
        .tier_of(&req.instance)
        .ok_or_else(|| BoardError::UnknownInstance(req.instance.clone()))?;
    let column = if req.tier.is_unassigned() { 0 } else { req.column };

    if *current == req.tier && board.column_of(&req.instance) == Some(column) {
        return Ok(Arc::clone(board));
    }

    debug!(
        instance = %req.instance,
        from = %current,
        to = %req.tier,
        column,
        "transfer"
    );

    let mut next = Board::clone(board);
    next.detach(&req.instance);
    next.bucket_mut(&req.tier).push(req.instance.clone());
    next.set_column(&req.instance, column);
    Ok(Arc::new(next))
}

/// Split a bucket into its columns, keeping bucket order within each.
///
/// Instances whose column is out of range (e.g. after the column count
/// shrank) show up in no column.
pub fn columns_for(board: &Board, tier: &TierId, column_count: usize) -> Vec<Vec<InstanceId>> {
    let mut columns = vec![Vec::new(); column_count];
    for id in board.bucket(tier) {
        let column = board.column_of(id).unwrap_or(0);
        if let Some(slot) = columns.get_mut(column) {
            slot.push(id.clone());
        }
    }
    columns
}

/// Payload carried by a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEvent {
    pub instance: InstanceId,
    pub kind: ItemKind,
}

/// A bucket/column cell that can receive drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub kind: ItemKind,
    pub tier: TierId,
    #[serde(default)]
    pub column: usize,
}

impl DropTarget {
    /// Characters and weapons live in separate grids.
    pub fn accepts(&self, event: &DropEvent) -> bool {
        self.kind == event.kind
    }

    pub fn request_for(&self, event: &DropEvent) -> TransferRequest {
        TransferRequest::new(event.instance.clone(), self.tier.clone(), self.column)
    }
}
