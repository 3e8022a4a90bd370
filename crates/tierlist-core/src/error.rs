//! Error types for tierlist-core

use thiserror::Error;

use crate::catalog::ItemKind;
use crate::instance::InstanceId;
use crate::template::TemplateId;
use crate::tier::TierId;

/// Result type alias for tier list operations
pub type Result<T> = std::result::Result<T, TierListError>;

/// Main error type for tier list operations
#[derive(Error, Debug)]
pub enum TierListError {
    /// Board (assignment/column table) errors
    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    /// Template store errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Durable storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Catalog construction errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

/// Errors raised by board transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Instance is not live on the board
    #[error("Unknown instance: {0}")]
    UnknownInstance(InstanceId),

    /// A duplicate id collided with a live instance
    #[error("Instance already exists: {0}")]
    DuplicateInstance(InstanceId),

    /// Tier is not part of the active template
    #[error("Unknown tier: {0}")]
    UnknownTier(TierId),

    /// Column outside the active template's column range
    #[error("Column {column} out of range (template has {column_count} columns)")]
    InvalidColumn { column: usize, column_count: usize },

    /// Item kind does not match the board's kind
    #[error("Expected {expected} item, got {actual}")]
    WrongKind { expected: ItemKind, actual: ItemKind },
}

/// Errors raised by the template store and template edits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No template with this id
    #[error("Template not found: {0}")]
    NotFound(TemplateId),

    /// Builtin templates cannot be edited or deleted
    #[error("Template {0} is builtin and cannot be modified")]
    BuiltinImmutable(TemplateId),

    /// No tier with this id in the template
    #[error("Tier {tier} not found in template {template}")]
    TierNotFound { template: TemplateId, tier: TierId },

    /// A template must keep at least one tier
    #[error("Template {0} must keep at least one tier")]
    LastTier(TemplateId),

    /// Column count outside 1..=max
    #[error("Invalid column count {count} (allowed 1..={max})")]
    InvalidColumns { count: usize, max: usize },

    /// Template kind does not match the store's kind
    #[error("Template {id} is for {actual} items, store holds {expected} templates")]
    WrongKind {
        id: TemplateId,
        expected: ItemKind,
        actual: ItemKind,
    },
}

/// Durable key-value storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store refused the write (size limit reached)
    #[error("Quota exceeded writing {key} ({size} bytes)")]
    QuotaExceeded { key: String, size: usize },

    /// Stored data has an unsupported format version
    #[error("Format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TierListError {
    fn from(err: serde_json::Error) -> Self {
        TierListError::Storage(StorageError::Serialization(err.to_string()))
    }
}

impl From<std::io::Error> for TierListError {
    fn from(err: std::io::Error) -> Self {
        TierListError::Storage(StorageError::Io(err.to_string()))
    }
}
