//! Events flowing from the backend worker to the settings panel.

use std::path::PathBuf;

pub enum PanelEvent {
    WorkerReady,
    /// Decaying alert in the panel's notice stack.
    Transient(String),
    /// Modal dialog the user must dismiss.
    Blocking { title: String, body: String },
    ValidationFinished { valid: bool },
    SettingsSaved { path: PathBuf },
    Error(String),
}
