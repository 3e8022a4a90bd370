//! Tierlist Core - tier assignment and drag-transfer engine
//!
//! This crate provides the state model behind a tier list builder for game
//! characters and weapons:
//!
//! - **Catalog**: the read-only item list a board is built from
//! - **Board**: immutable snapshot of the Assignment Table (tier → ordered
//!   instances) and the Column Table (instance → column)
//! - **Transfer**: moving instances between tier/column cells, drag protocol
//! - **Instances**: duplicating and removing placeable instances
//! - **Templates**: builtin and custom tier schemas, edits, persistence
//! - **Session**: the context object a page drives, plus `InstanceActions`
//! - **Command**: serde-tagged commands for scripted sessions
//! - **Config**: board limits and storage keys
//!
//! # Architecture
//!
//! Every transition takes an `Arc<Board>` and returns a new one; a no-op
//! returns the same `Arc`. The session swaps its board with a single
//! assignment, so readers holding an older snapshot always see a complete
//! partition:
//!
//! ```text
//! DropEvent → TierListSession::handle_drop → transfer(board, request) → Arc<Board>
//! ```

pub mod board;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod instance;
pub mod instances;
pub mod query;
pub mod session;
pub mod storage;
pub mod template;
pub mod template_store;
pub mod tier;
pub mod transfer;

pub use board::Board;
pub use catalog::{Catalog, Item, ItemId, ItemKind};
pub use command::{Command, CommandOutput};
pub use config::{BoardConfig, StorageConfig, TierListConfig};
pub use error::{BoardError, Result, StorageError, TemplateError, TierListError};
pub use instance::{DuplicateToken, DuplicateTokens, Instance, InstanceId, ItemDisplay, Variant};
pub use instances::{DuplicatePlacement, Duplicated, Removal};
pub use query::{parse_pool_query, PoolQuery};
pub use session::{DropOutcome, InstanceActions, PlacementSnapshot, TierListSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use template::{
    builtin_templates, EditOutcome, Template, TemplateDraft, TemplateEdit, TemplateId,
};
pub use template_store::{Deleted, Edited, SaveOutcome, TemplateSource, TemplateStore};
pub use tier::{TierDef, TierId};
pub use transfer::{columns_for, DropEvent, DropTarget, TransferRequest};
