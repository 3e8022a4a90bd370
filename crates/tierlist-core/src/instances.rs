//! Instance manager: duplicating and removing instances.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::board::Board;
use crate::error::BoardError;
use crate::instance::{DuplicateToken, Instance, InstanceId};
use crate::tier::TierId;

/// Where a new duplicate ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePlacement {
    /// Directly after the source instance
    AfterSource,
    /// Source was not in the given tier; appended to its end
    Appended,
}

/// Result of a duplication.
#[derive(Debug, Clone)]
pub struct Duplicated {
    pub board: Arc<Board>,
    pub id: InstanceId,
    pub placement: DuplicatePlacement,
}

/// Copy `source` into `within`, right after the source's position.
///
/// The copy takes the source's column (always 0 inside `unassigned`) and
/// its own clone of the source's display. If the source isn't in `within`
/// the copy is appended there and a warning is logged.
pub fn duplicate(
    board: &Arc<Board>,
    source: &InstanceId,
    within: &TierId,
    token: DuplicateToken,
) -> Result<Duplicated, BoardError> {
    let original = board
        .instance(source)
        .ok_or_else(|| BoardError::UnknownInstance(source.clone()))?;
    let id = InstanceId::duplicate(source.base.clone(), token);
    if board.contains(&id) {
        return Err(BoardError::DuplicateInstance(id));
    }

    let column = if within.is_unassigned() {
        0
    } else {
        board.column_of(source).unwrap_or(0)
    };
    let (index, placement) = match board.position(within, source) {
        Some(i) => (Some(i + 1), DuplicatePlacement::AfterSource),
        None => {
            warn!(
                source = %source,
                tier = %within,
                actual = ?board.tier_of(source).map(|t| t.to_string()),
                "duplicate source not found in tier, appending"
            );
            (None, DuplicatePlacement::Appended)
        }
    };

    let copy = Instance {
        id: id.clone(),
        display: original.display.clone(),
    };
    let mut next = Board::clone(board);
    next.insert_instance(copy, within, index, column);
    debug!(source = %source, duplicate = %id, tier = %within, "duplicated");

    Ok(Duplicated {
        board: Arc::new(next),
        id,
        placement,
    })
}

/// What `remove` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Original moved back to `unassigned`
    Recycled,
    /// Duplicate erased
    Destroyed,
    /// Original was already unassigned at column 0
    Unchanged,
}

/// Remove an instance from the board.
///
/// Originals go back to `unassigned` (column 0) so the item stays
/// selectable. Duplicates are erased for good.
pub fn remove(board: &Arc<Board>, id: &InstanceId) -> Result<(Arc<Board>, Removal), BoardError> {
    let tier = board
        .tier_of(id)
        .ok_or_else(|| BoardError::UnknownInstance(id.clone()))?;

    if id.is_duplicate() {
        let mut next = Board::clone(board);
        next.destroy_instance(id);
        debug!(instance = %id, "destroyed duplicate");
        return Ok((Arc::new(next), Removal::Destroyed));
    }

    if tier.is_unassigned() && board.column_of(id) == Some(0) {
        return Ok((Arc::clone(board), Removal::Unchanged));
    }

    let mut next = Board::clone(board);
    next.detach(id);
    next.bucket_mut(&TierId::unassigned()).push(id.clone());
    next.set_column(id, 0);
    debug!(instance = %id, "recycled original");
    Ok((Arc::new(next), Removal::Recycled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Item, ItemKind};
    use crate::transfer::{transfer, TransferRequest};

    fn board() -> Arc<Board> {
        let catalog = Catalog::new(
            ItemKind::Character,
            vec![
                Item::new("a", ItemKind::Character, "A"),
                Item::new("b", ItemKind::Character, "B"),
                Item::new("c", ItemKind::Character, "C"),
            ],
        )
        .unwrap();
        let tiers = [TierId::from("s")];
        Arc::new(Board::from_catalog(&catalog, &tiers))
    }

    fn to_s(board: &Arc<Board>, id: &str, column: usize) -> Arc<Board> {
        transfer(
            board,
            &TransferRequest::new(InstanceId::from(id), TierId::from("s"), column),
        )
        .unwrap()
    }

    #[test]
    fn duplicate_lands_after_source() {
        let b = to_s(&to_s(&board(), "a", 1), "b", 0);
        let s = TierId::from("s");
        let dup = duplicate(&b, &InstanceId::from("a"), &s, DuplicateToken(9)).unwrap();
        let bucket = dup.board.bucket(&s);
        assert_eq!(bucket[1], dup.id);
        assert_eq!(bucket.len(), 3);
        assert_eq!(dup.placement, DuplicatePlacement::AfterSource);
        assert_eq!(dup.board.column_of(&dup.id), Some(1));
        dup.board.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_falls_back_to_append() {
        let b = to_s(&board(), "b", 0);
        let s = TierId::from("s");
        let dup = duplicate(&b, &InstanceId::from("a"), &s, DuplicateToken(1)).unwrap();
        assert_eq!(dup.placement, DuplicatePlacement::Appended);
        assert_eq!(dup.board.bucket(&s).last(), Some(&dup.id));
        dup.board.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_into_unassigned_uses_column_zero() {
        let b = to_s(&board(), "a", 2);
        let unassigned = TierId::unassigned();
        let dup = duplicate(&b, &InstanceId::from("a"), &unassigned, DuplicateToken(4)).unwrap();
        assert_eq!(dup.placement, DuplicatePlacement::Appended);
        assert_eq!(dup.board.column_of(&dup.id), Some(0));
        assert_eq!(dup.board.column_of(&InstanceId::from("a")), Some(2));
        assert_eq!(dup.board.bucket(&unassigned).last(), Some(&dup.id));
        dup.board.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_copies_display() {
        let c = InstanceId::from("c");
        let dup = duplicate(&board(), &c, &TierId::unassigned(), DuplicateToken(3)).unwrap();
        let copy = dup.board.instance(&dup.id).unwrap();
        assert_eq!(copy.display.name, "C");
    }

    #[test]
    fn repeated_token_is_rejected() {
        let a = InstanceId::from("a");
        let unassigned = TierId::unassigned();
        let first = duplicate(&board(), &a, &unassigned, DuplicateToken(5)).unwrap();
        let err = duplicate(&first.board, &a, &unassigned, DuplicateToken(5)).unwrap_err();
        assert!(matches!(err, BoardError::DuplicateInstance(_)));
    }

    #[test]
    fn remove_original_recycles() {
        let b = to_s(&board(), "a", 2);
        let (next, removal) = remove(&b, &InstanceId::from("a")).unwrap();
        assert_eq!(removal, Removal::Recycled);
        assert_eq!(next.tier_of(&InstanceId::from("a")), Some(&TierId::unassigned()));
        assert_eq!(next.column_of(&InstanceId::from("a")), Some(0));
        next.check_invariants().unwrap();
    }

    #[test]
    fn remove_unassigned_original_is_noop() {
        let b = board();
        let (next, removal) = remove(&b, &InstanceId::from("a")).unwrap();
        assert_eq!(removal, Removal::Unchanged);
        assert!(Arc::ptr_eq(&b, &next));
    }

    #[test]
    fn remove_duplicate_destroys() {
        let a = InstanceId::from("a");
        let dup = duplicate(&board(), &a, &TierId::unassigned(), DuplicateToken(2)).unwrap();
        let (next, removal) = remove(&dup.board, &dup.id).unwrap();
        assert_eq!(removal, Removal::Destroyed);
        assert!(!next.contains(&dup.id));
        assert_eq!(next.column_of(&dup.id), None);
        assert!(next.tier_of(&dup.id).is_none());
        next.check_invariants().unwrap();
        assert!(remove(&next, &dup.id).is_err());
    }
}
