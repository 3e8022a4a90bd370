//! Scripted commands executed on a session

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instance::InstanceId;
use crate::instances::Removal;
use crate::session::{DropOutcome, TierListSession};
use crate::template::{EditOutcome, TemplateEdit, TemplateId};
use crate::template_store::SaveOutcome;
use crate::tier::TierId;
use crate::transfer::{DropEvent, DropTarget, TransferRequest};

/// Commands that can be executed on a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Move an instance to a tier and column
    Transfer {
        instance: InstanceId,
        tier: TierId,
        #[serde(default)]
        column: usize,
    },

    /// Deliver a drag gesture
    Drop { event: DropEvent, target: DropTarget },

    /// Duplicate an instance within a tier
    Duplicate { source: InstanceId, tier: TierId },

    /// Remove an instance
    Remove { instance: InstanceId },

    /// Move an instance within its tier
    ChangeColumn { instance: InstanceId, column: usize },

    /// Rename a single instance
    Rename { instance: InstanceId, name: String },

    /// Switch templates
    SelectTemplate { template: TemplateId },

    /// Clone a template, apply edits and save it as a custom template
    SaveAs {
        source: TemplateId,
        name: String,
        #[serde(default)]
        edits: Vec<TemplateEdit>,
        /// Select the new template afterwards
        #[serde(default)]
        select: bool,
    },

    /// Delete a custom template
    DeleteTemplate { template: TemplateId },

    /// Edit the active custom template
    EditTemplate { edit: TemplateEdit },

    /// Persist current placements
    SavePlacements,

    /// Reload persisted placements
    RestorePlacements,
}

/// What a command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Whether the board changed
    Moved(bool),
    Dropped(DropOutcome),
    Duplicated(InstanceId),
    Removed(Removal),
    Renamed,
    Selected(TemplateId),
    Saved(SaveOutcome),
    Deleted { template: TemplateId, was_active: bool },
    Edited(EditOutcome),
    PlacementsSaved,
    PlacementsRestored(bool),
}

impl Command {
    /// Execute the command on the given session
    pub fn execute(self, session: &mut TierListSession) -> Result<CommandOutput> {
        match self {
            Command::Transfer {
                instance,
                tier,
                column,
            } => {
                let request = TransferRequest::new(instance, tier, column);
                Ok(CommandOutput::Moved(session.transfer(&request)?))
            }

            Command::Drop { event, target } => {
                Ok(CommandOutput::Dropped(session.handle_drop(&event, &target)?))
            }

            Command::Duplicate { source, tier } => {
                Ok(CommandOutput::Duplicated(session.duplicate(&source, &tier)?))
            }

            Command::Remove { instance } => Ok(CommandOutput::Removed(session.remove(&instance)?)),

            Command::ChangeColumn { instance, column } => {
                Ok(CommandOutput::Moved(session.change_column(&instance, column)?))
            }

            Command::Rename { instance, name } => {
                session.rename_instance(&instance, &name)?;
                Ok(CommandOutput::Renamed)
            }

            Command::SelectTemplate { template } => {
                session.select_template(&template)?;
                Ok(CommandOutput::Selected(template))
            }

            Command::SaveAs {
                source,
                name,
                edits,
                select,
            } => {
                let mut draft = session.draft_from(&source, name)?;
                let max_columns = session.config().board.max_columns;
                for edit in &edits {
                    draft.apply(edit, max_columns)?;
                }
                let saved = session.save_as_template(draft)?;
                if select {
                    session.select_template(&saved.id)?;
                }
                Ok(CommandOutput::Saved(saved))
            }

            Command::DeleteTemplate { template } => {
                let deleted = session.delete_template(&template)?;
                Ok(CommandOutput::Deleted {
                    template,
                    was_active: deleted.was_active,
                })
            }

            Command::EditTemplate { edit } => {
                Ok(CommandOutput::Edited(session.edit_active_template(&edit)?))
            }

            Command::SavePlacements => {
                session.save_placements()?;
                Ok(CommandOutput::PlacementsSaved)
            }

            Command::RestorePlacements => {
                Ok(CommandOutput::PlacementsRestored(session.restore_placements()?))
            }
        }
    }
}
