//! Commands queued from the settings panel to the backend worker.

use std::path::PathBuf;

use nuorder::ConnectorSettings;
use settings_form::FormAction;

pub enum PanelCommand {
    /// Fire one form action against the given settings record.
    RunAction {
        action: FormAction,
        record: ConnectorSettings,
    },
    /// Run the validate hook; persist the record only when it passes.
    ValidateAndSave {
        record: ConnectorSettings,
        section: String,
        path: PathBuf,
    },
}

impl PanelCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PanelCommand::RunAction { action, .. } => action.label(),
            PanelCommand::ValidateAndSave { .. } => "validate_and_save",
        }
    }
}
