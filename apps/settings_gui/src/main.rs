use std::path::PathBuf;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::PanelCommand;
use backend_bridge::runtime::spawn_backend_thread;
use controller::events::PanelEvent;
use nuorder::config::{self, SettingsOverrides};
use ui::app::SettingsPanelApp;

#[derive(Parser, Debug)]
#[command(about = "Settings panel for the NuOrder connector")]
struct Args {
    /// Config section the panel edits.
    #[arg(short = 'c', long, default_value = config::DEFAULT_SECTION)]
    config_section: String,
    /// Config file path (default: ~/.config/nuorder.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    // Tokens may be absent before the first bootstrap; start with whatever the
    // section holds and let the user fill in the rest.
    let initial = config::load_bootstrap_settings(
        Some(&config_path),
        &args.config_section,
        &SettingsOverrides::default(),
    )
    .ok();

    let (cmd_tx, cmd_rx) = bounded::<PanelCommand>(64);
    let (ui_tx, ui_rx) = bounded::<PanelEvent>(256);
    spawn_backend_thread(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("nuOrder Settings")
            .with_inner_size([760.0, 620.0])
            .with_min_inner_size([620.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "nuOrder Settings",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(SettingsPanelApp::new(
                cmd_tx,
                ui_rx,
                initial,
                config_path,
                args.config_section,
            )))
        }),
    )
}
