use std::{path::PathBuf, sync::Arc};

mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Context};
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use shared::regions::RegionSet;
use signup_core::{build_store, load_settings, SignupService};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::SignupFormApp;

#[derive(Parser, Debug)]
#[command(about = "Sign-up form backed by a document store")]
struct Args {
    /// Config file; defaults to ./signup.toml when present. Set
    /// `store_backend = "cosmos"` to persist remotely; an emulator
    /// certificate is trusted once installed in the OS certificate store.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    let store = build_store(&settings).context("failed to build store client")?;
    let service = SignupService::new(store, settings.store_target());
    let regions = Arc::new(RegionSet::default());

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    let worker = backend_bridge::runtime::launch(service, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Sign up")
            .with_inner_size([480.0, 320.0])
            .with_min_inner_size([400.0, 280.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Sign up",
        options,
        Box::new(move |_cc| Ok(Box::new(SignupFormApp::new(regions, cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow!("sign-up window failed: {err}"))?;

    // the app (and with it the command sender) is gone; let queued writes finish
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    Ok(())
}
