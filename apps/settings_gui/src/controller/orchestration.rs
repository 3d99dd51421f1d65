//! Dispatch helper from panel interactions to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::PanelCommand;

/// Queues one command without blocking the UI thread. Returns whether the
/// command was accepted; failure reasons land in `status`.
pub fn dispatch_panel_command(
    cmd_tx: &Sender<PanelCommand>,
    cmd: PanelCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued panel command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "Command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend worker disconnected (possible startup failure); restart the app"
                    .to_string();
            false
        }
    }
}
