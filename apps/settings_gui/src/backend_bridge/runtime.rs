//! Backend worker: owns the tokio runtime and executes panel commands.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use nuorder::{
    catalog::{CatalogSource, MissingCatalog, TomlCatalog},
    config, ConnectorOps, ConnectorSettings, SyncLog,
};
use settings_form::Notifier;

use crate::backend_bridge::commands::PanelCommand;
use crate::controller::events::PanelEvent;

struct ChannelNotifier {
    ui_tx: Sender<PanelEvent>,
}

impl Notifier for ChannelNotifier {
    fn transient(&self, message: &str) {
        let _ = self.ui_tx.try_send(PanelEvent::Transient(message.to_string()));
    }

    fn blocking(&self, title: &str, body: &str) {
        let _ = self.ui_tx.try_send(PanelEvent::Blocking {
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

fn build_ops(record: &ConnectorSettings) -> ConnectorOps {
    let catalog: Arc<dyn CatalogSource> = match &record.catalog_path {
        Some(path) => Arc::new(TomlCatalog::new(path)),
        None => Arc::new(MissingCatalog),
    };
    let log = match &record.sync_log_path {
        Some(path) => Arc::new(SyncLog::to_file(path)),
        None => Arc::new(SyncLog::in_memory()),
    };
    ConnectorOps::new(record.clone(), catalog, log)
}

pub fn spawn_backend_thread(cmd_rx: Receiver<PanelCommand>, ui_tx: Sender<PanelEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(PanelEvent::Error(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(PanelEvent::WorkerReady);

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "processing panel command");
                match cmd {
                    PanelCommand::RunAction { action, record } => {
                        // Fire-and-forget: each action runs independently, so
                        // several clicks yield several in-flight requests that
                        // complete in arbitrary order.
                        let notifier = ChannelNotifier {
                            ui_tx: ui_tx.clone(),
                        };
                        tokio::spawn(async move {
                            let ops = build_ops(&record);
                            settings_form::run_action(action, &ops, &notifier).await;
                        });
                    }
                    PanelCommand::ValidateAndSave {
                        record,
                        section,
                        path,
                    } => {
                        // Deliberately awaited inline: command processing stays
                        // blocked until the bounded connection check resolves.
                        let notifier = ChannelNotifier {
                            ui_tx: ui_tx.clone(),
                        };
                        let ops = build_ops(&record);
                        let outcome = settings_form::validate(&ops, &notifier).await;
                        let valid = outcome.is_valid();
                        if valid {
                            match config::save_settings(&path, &section, &record) {
                                Ok(()) => {
                                    let _ = ui_tx.try_send(PanelEvent::SettingsSaved {
                                        path: path.clone(),
                                    });
                                }
                                Err(err) => {
                                    let _ = ui_tx.try_send(PanelEvent::Error(format!(
                                        "failed to save settings: {err}"
                                    )));
                                }
                            }
                        }
                        let _ = ui_tx.try_send(PanelEvent::ValidationFinished { valid });
                    }
                }
            }
        });
    });
}
