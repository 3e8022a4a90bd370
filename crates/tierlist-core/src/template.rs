//! Templates: ordered tier definitions plus column configuration.
//!
//! Builtin templates are compiled in and never change. Custom templates are
//! cloned from another template through a [`TemplateDraft`], edited with
//! [`TemplateEdit`]s, and saved by the template store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemKind;
use crate::error::TemplateError;
use crate::tier::{default_tier_color, TierDef, TierId};

/// Identifier of a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id for a custom template.
    pub fn generate_custom() -> Self {
        Self(format!("custom-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A classification schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub kind: ItemKind,
    pub tiers: Vec<TierDef>,
    /// Zero when absent from stored data; the store fills in the default.
    #[serde(default)]
    pub column_count: usize,
    #[serde(default)]
    pub column_labels: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ItemKind,
        tiers: Vec<TierDef>,
    ) -> Self {
        Self {
            id: TemplateId::new(id),
            name: name.into(),
            kind,
            tiers,
            column_count: 1,
            column_labels: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_columns(mut self, labels: &[&str]) -> Self {
        self.column_count = labels.len().max(1);
        self.column_labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn tier(&self, id: &TierId) -> Option<&TierDef> {
        self.tiers.iter().find(|t| &t.id == id)
    }

    pub fn tier_ids(&self) -> Vec<TierId> {
        self.tiers.iter().map(|t| t.id.clone()).collect()
    }

    pub fn has_tier(&self, id: &TierId) -> bool {
        self.tier(id).is_some()
    }

    /// Label for a column, falling back to "Column N".
    pub fn column_label(&self, column: usize) -> String {
        self.column_labels
            .get(column)
            .filter(|l| !l.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Column {}", column + 1))
    }

    fn index_of(&self, tier: &TierId) -> Result<usize, TemplateError> {
        self.tiers
            .iter()
            .position(|t| &t.id == tier)
            .ok_or_else(|| TemplateError::TierNotFound {
                template: self.id.clone(),
                tier: tier.clone(),
            })
    }

    /// Apply an edit in place. Builtin protection is the store's job.
    pub fn apply(
        &mut self,
        edit: &TemplateEdit,
        max_columns: usize,
    ) -> Result<EditOutcome, TemplateError> {
        match edit {
            TemplateEdit::AddTier { label, color } => {
                let id = TierId::generate();
                let color = color
                    .clone()
                    .unwrap_or_else(|| default_tier_color(self.tiers.len()).to_string());
                self.tiers.push(TierDef {
                    id: id.clone(),
                    label: label.clone(),
                    color,
                });
                Ok(EditOutcome::TierAdded(id))
            }
            TemplateEdit::RemoveTier { tier } => {
                let index = self.index_of(tier)?;
                if self.tiers.len() == 1 {
                    return Err(TemplateError::LastTier(self.id.clone()));
                }
                self.tiers.remove(index);
                Ok(EditOutcome::TierRemoved(tier.clone()))
            }
            TemplateEdit::MoveTierUp { tier } => {
                let index = self.index_of(tier)?;
                if index == 0 {
                    return Ok(EditOutcome::Unchanged);
                }
                self.tiers.swap(index, index - 1);
                Ok(EditOutcome::Reordered)
            }
            TemplateEdit::MoveTierDown { tier } => {
                let index = self.index_of(tier)?;
                if index + 1 >= self.tiers.len() {
                    return Ok(EditOutcome::Unchanged);
                }
                self.tiers.swap(index, index + 1);
                Ok(EditOutcome::Reordered)
            }
            TemplateEdit::Recolor { tier, color } => {
                let index = self.index_of(tier)?;
                self.tiers[index].color = color.clone();
                Ok(EditOutcome::Cosmetic)
            }
            TemplateEdit::RenameTier { tier, label } => {
                let index = self.index_of(tier)?;
                self.tiers[index].label = label.clone();
                Ok(EditOutcome::Cosmetic)
            }
            TemplateEdit::RenameTemplate { name } => {
                self.name = name.clone();
                Ok(EditOutcome::Cosmetic)
            }
            TemplateEdit::SetColumns { count, labels } => {
                if *count == 0 || *count > max_columns {
                    return Err(TemplateError::InvalidColumns {
                        count: *count,
                        max: max_columns,
                    });
                }
                let mut labels = labels.clone();
                labels.truncate(*count);
                if *count == self.column_count && labels == self.column_labels {
                    return Ok(EditOutcome::Unchanged);
                }
                let count_changed = *count != self.column_count;
                self.column_count = *count;
                self.column_labels = labels;
                Ok(if count_changed {
                    EditOutcome::ColumnsChanged
                } else {
                    EditOutcome::Cosmetic
                })
            }
        }
    }
}

/// A single change to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TemplateEdit {
    AddTier {
        label: String,
        #[serde(default)]
        color: Option<String>,
    },
    RemoveTier { tier: TierId },
    MoveTierUp { tier: TierId },
    MoveTierDown { tier: TierId },
    Recolor { tier: TierId, color: String },
    RenameTier { tier: TierId, label: String },
    RenameTemplate { name: String },
    SetColumns {
        count: usize,
        #[serde(default)]
        labels: Vec<String>,
    },
}

/// What an edit changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing changed (e.g. moving the top tier up)
    Unchanged,
    /// Labels, colors or names only
    Cosmetic,
    /// Tier order changed
    Reordered,
    /// Column count changed
    ColumnsChanged,
    TierAdded(TierId),
    TierRemoved(TierId),
}

impl EditOutcome {
    /// Whether the set of tiers changed.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::TierAdded(_) | Self::TierRemoved(_))
    }
}

/// Edit buffer for a cloned template, builtin or custom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    template: Template,
}

impl TemplateDraft {
    /// Clone `source` under a new display name.
    pub fn from_template(source: &Template, name: impl Into<String>) -> Self {
        let mut template = source.clone();
        template.name = name.into();
        template.created_at = None;
        Self { template }
    }

    pub fn apply(
        &mut self,
        edit: &TemplateEdit,
        max_columns: usize,
    ) -> Result<EditOutcome, TemplateError> {
        self.template.apply(edit, max_columns)
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Finalize under the id chosen by the store.
    pub(crate) fn into_template(self, id: TemplateId) -> Template {
        let mut template = self.template;
        template.id = id;
        template.created_at = Some(Utc::now());
        template
    }
}

fn rank_tiers(labels: &[&str]) -> Vec<TierDef> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| TierDef::new(label.to_lowercase(), *label, default_tier_color(i)))
        .collect()
}

/// The builtin templates of a kind. The first one is the default.
pub fn builtin_templates(kind: ItemKind) -> Vec<Template> {
    let standard = Template::new(
        "standard",
        "Standard",
        kind,
        rank_tiers(&["S", "A", "B", "C", "D"]),
    );
    let extended = Template::new(
        "extended",
        "Extended",
        kind,
        rank_tiers(&["SS", "S", "A", "B", "C", "D", "F"]),
    );
    match kind {
        ItemKind::Character => vec![
            standard,
            extended,
            Template::new("roles", "By Role", kind, rank_tiers(&["S", "A", "B", "C"]))
                .with_columns(&["Main DPS", "Sub DPS", "Support"]),
        ],
        ItemKind::Weapon => vec![standard, extended],
    }
}
