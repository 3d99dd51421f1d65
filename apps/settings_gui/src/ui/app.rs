//! The settings panel: credential fields, the form's action buttons, alert
//! stack, and modal dialogs.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use nuorder::{config, ConnectorSettings};
use settings_form::{ButtonEmphasis, FormAction};

use crate::backend_bridge::commands::PanelCommand;
use crate::controller::events::PanelEvent;
use crate::controller::orchestration::dispatch_panel_command;

const ALERT_TTL: Duration = Duration::from_secs(6);

/// Editable string form of the settings record. Parsed into a
/// [`ConnectorSettings`] each time an action fires, so a half-edited record
/// never reaches the backend.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub hostname: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub app_name: String,
    pub verify_ssl: bool,
    pub request_timeout_secs: String,
    pub catalog_path: String,
    pub sync_log_path: String,
}

impl Default for RecordDraft {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            oauth_token: String::new(),
            oauth_token_secret: String::new(),
            app_name: String::new(),
            verify_ssl: true,
            request_timeout_secs: config::DEFAULT_TIMEOUT_SECS.to_string(),
            catalog_path: String::new(),
            sync_log_path: String::new(),
        }
    }
}

impl RecordDraft {
    pub fn from_settings(settings: &ConnectorSettings) -> Self {
        Self {
            hostname: settings.hostname.clone(),
            consumer_key: settings.consumer_key.clone(),
            consumer_secret: settings.consumer_secret.clone(),
            oauth_token: settings.oauth_token.clone(),
            oauth_token_secret: settings.oauth_token_secret.clone(),
            app_name: settings.app_name.clone().unwrap_or_default(),
            verify_ssl: settings.verify_ssl,
            request_timeout_secs: settings.request_timeout_secs.to_string(),
            catalog_path: settings
                .catalog_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            sync_log_path: settings
                .sync_log_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn to_record(&self) -> Result<ConnectorSettings, String> {
        let hostname =
            config::normalize_hostname(&self.hostname).map_err(|err| err.to_string())?;
        let request_timeout_secs = self
            .request_timeout_secs
            .trim()
            .parse::<u64>()
            .map_err(|_| "request timeout must be a number of seconds".to_string())?;
        if request_timeout_secs == 0 {
            return Err("request timeout must be at least one second".to_string());
        }
        Ok(ConnectorSettings {
            hostname,
            consumer_key: self.consumer_key.trim().to_string(),
            consumer_secret: self.consumer_secret.trim().to_string(),
            oauth_token: self.oauth_token.trim().to_string(),
            oauth_token_secret: self.oauth_token_secret.trim().to_string(),
            app_name: none_if_empty(&self.app_name),
            verify_ssl: self.verify_ssl,
            request_timeout_secs,
            catalog_path: none_if_empty(&self.catalog_path).map(PathBuf::from),
            sync_log_path: none_if_empty(&self.sync_log_path).map(PathBuf::from),
        })
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

struct Alert {
    message: String,
    raised_at: Instant,
}

struct Dialog {
    title: String,
    body: String,
}

pub struct SettingsPanelApp {
    cmd_tx: Sender<PanelCommand>,
    ui_rx: Receiver<PanelEvent>,
    draft: RecordDraft,
    config_path: PathBuf,
    config_section: String,
    status: String,
    validating: bool,
    alerts: Vec<Alert>,
    dialog: Option<Dialog>,
}

impl SettingsPanelApp {
    pub fn new(
        cmd_tx: Sender<PanelCommand>,
        ui_rx: Receiver<PanelEvent>,
        initial: Option<ConnectorSettings>,
        config_path: PathBuf,
        config_section: String,
    ) -> Self {
        let draft = initial
            .as_ref()
            .map(RecordDraft::from_settings)
            .unwrap_or_default();
        Self {
            cmd_tx,
            ui_rx,
            draft,
            config_path,
            config_section,
            status: "Backend worker starting...".to_string(),
            validating: false,
            alerts: Vec::new(),
            dialog: None,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                PanelEvent::WorkerReady => {
                    self.status = "Backend worker ready".to_string();
                }
                PanelEvent::Transient(message) => {
                    self.alerts.push(Alert {
                        message,
                        raised_at: Instant::now(),
                    });
                }
                PanelEvent::Blocking { title, body } => {
                    self.dialog = Some(Dialog { title, body });
                }
                PanelEvent::ValidationFinished { valid } => {
                    self.validating = false;
                    self.status = if valid {
                        "Connection validated".to_string()
                    } else {
                        "Validation failed; settings not saved".to_string()
                    };
                }
                PanelEvent::SettingsSaved { path } => {
                    self.status = format!("Settings saved to {}", path.display());
                }
                PanelEvent::Error(message) => {
                    tracing::error!("{message}");
                    self.status = message;
                }
            }
        }
        self.alerts
            .retain(|alert| alert.raised_at.elapsed() < ALERT_TTL);
    }

    fn dispatch_action(&mut self, action: FormAction) {
        match self.draft.to_record() {
            Ok(record) => {
                dispatch_panel_command(
                    &self.cmd_tx,
                    PanelCommand::RunAction { action, record },
                    &mut self.status,
                );
            }
            Err(err) => self.status = err,
        }
    }

    fn dispatch_save(&mut self) {
        match self.draft.to_record() {
            Ok(record) => {
                let queued = dispatch_panel_command(
                    &self.cmd_tx,
                    PanelCommand::ValidateAndSave {
                        record,
                        section: self.config_section.clone(),
                        path: self.config_path.clone(),
                    },
                    &mut self.status,
                );
                if queued {
                    self.validating = true;
                    self.status = "Validating connection...".to_string();
                }
            }
            Err(err) => self.status = err,
        }
    }

    fn credentials_grid(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("settings_fields")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("Hostname");
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.hostname)
                        .hint_text("wholesale.sandbox1.nuorder.com")
                        .desired_width(320.0),
                );
                ui.end_row();

                ui.label("Consumer key");
                ui.add(egui::TextEdit::singleline(&mut self.draft.consumer_key).desired_width(320.0));
                ui.end_row();

                ui.label("Consumer secret");
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.consumer_secret)
                        .password(true)
                        .desired_width(320.0),
                );
                ui.end_row();

                ui.label("OAuth token");
                ui.add(egui::TextEdit::singleline(&mut self.draft.oauth_token).desired_width(320.0));
                ui.end_row();

                ui.label("OAuth token secret");
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.oauth_token_secret)
                        .password(true)
                        .desired_width(320.0),
                );
                ui.end_row();

                ui.label("App name");
                ui.add(egui::TextEdit::singleline(&mut self.draft.app_name).desired_width(320.0));
                ui.end_row();

                ui.label("Verify SSL");
                ui.checkbox(&mut self.draft.verify_ssl, "");
                ui.end_row();

                ui.label("Request timeout (s)");
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.request_timeout_secs)
                        .desired_width(80.0),
                );
                ui.end_row();

                ui.label("Catalog file");
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.catalog_path)
                        .hint_text("catalog.toml")
                        .desired_width(320.0),
                );
                ui.end_row();

                ui.label("Sync log file");
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.sync_log_path)
                        .hint_text("nuorder-sync.jsonl")
                        .desired_width(320.0),
                );
                ui.end_row();
            });
    }

    fn action_row(&mut self, ui: &mut egui::Ui) {
        let mut clicked = None;
        ui.horizontal(|ui| {
            for &action in settings_form::actions() {
                let button = match action.emphasis() {
                    ButtonEmphasis::Primary => egui::Button::new(
                        egui::RichText::new(action.label())
                            .color(ui.visuals().strong_text_color()),
                    )
                    .fill(ui.visuals().selection.bg_fill),
                    ButtonEmphasis::Default => egui::Button::new(action.label()),
                };
                if ui.add(button).clicked() {
                    clicked = Some(action);
                }
            }
            ui.separator();
            if ui.button("Save").clicked() {
                self.dispatch_save();
            }
        });
        if let Some(action) = clicked {
            self.dispatch_action(action);
        }
    }

    fn alert_stack(&self, ui: &mut egui::Ui) {
        for alert in self.alerts.iter().rev() {
            ui.small(egui::RichText::new(&alert.message).weak());
        }
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let title = dialog.title.clone();
        let body = dialog.body.clone();
        let mut dismissed = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(body);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.dialog = None;
        }
    }

    fn show_validation_overlay(&self, ctx: &egui::Context) {
        if !self.validating {
            return;
        }
        egui::Window::new("Validating")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Validating connection... Hang tight!");
                });
            });
    }
}

impl eframe::App for SettingsPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let busy = self.validating || self.dialog.is_some();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("nuOrder Settings");
            ui.small(
                egui::RichText::new(format!("section: {}", self.config_section)).weak(),
            );
            ui.add_space(8.0);

            ui.add_enabled_ui(!busy, |ui| {
                self.credentials_grid(ui);
                ui.add_space(10.0);
                self.action_row(ui);
            });

            ui.add_space(10.0);
            ui.separator();
            ui.small(egui::RichText::new(&self.status).weak());
            self.alert_stack(ui);
        });

        self.show_dialog(ctx);
        self.show_validation_overlay(ctx);

        // Keep polling backend events and let alerts decay while idle.
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
