use thiserror::Error;

/// Kinds of edit the editor asks permission for before applying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditIntent {
    Insert,
    DeleteBackward,
    DeleteForward,
    /// Spell-check or autocorrect swapping existing text for new text.
    ReplaceText,
}

impl EditIntent {
    pub fn removes_text(&self) -> bool {
        !matches!(self, EditIntent::Insert)
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EditRejected {
    #[error("Deletion is off")]
    DeletionDisabled,
}

/// Whether `intent` may be applied with no-delete mode set as given.
pub fn check_edit(no_delete_mode: bool, intent: EditIntent) -> Result<(), EditRejected> {
    if no_delete_mode && intent.removes_text() {
        Err(EditRejected::DeletionDisabled)
    } else {
        Ok(())
    }
}

/// Notice shown after no-delete mode is toggled.
pub fn mode_notice(no_delete_mode: bool) -> &'static str {
    if no_delete_mode {
        "Deletion is off"
    } else {
        "Deletion is on"
    }
}
