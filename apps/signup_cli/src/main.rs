use std::{cell::RefCell, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    domain::{FormField, SignupRecord},
    protocol::StoredSignup,
    regions::RegionSet,
};
use signup_core::{
    build_store, load_settings, CreateRecordError, FormController, Notifier, RecordSink,
    SignupService,
};

/// Submits one sign-up through the same controller the window uses.
#[derive(Parser, Debug)]
struct Args {
    /// Config file; defaults to ./signup.toml when present. Set
    /// `store_backend = "cosmos"` to persist remotely; an emulator
    /// certificate is trusted once installed in the OS certificate store.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "")]
    first: String,
    #[arg(long, default_value = "")]
    last: String,
    #[arg(long, default_value = "")]
    number: String,
    #[arg(long, default_value = "")]
    region: String,
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        println!("{message}");
    }
}

#[derive(Default)]
struct PendingRecords(RefCell<Vec<SignupRecord>>);

impl RecordSink for &PendingRecords {
    fn create_record(&self, record: SignupRecord) {
        self.0.borrow_mut().push(record);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    let store = build_store(&settings)?;
    let service = SignupService::new(store, settings.store_target());

    let pending = PendingRecords::default();
    let mut controller =
        FormController::new(Arc::new(RegionSet::default()), ConsoleNotifier, &pending);
    controller.update_field(FormField::First, args.first);
    controller.update_field(FormField::Last, args.last);
    controller.update_field(FormField::Number, args.number);
    controller.update_field(FormField::Region, args.region);

    if controller.submit().is_err() {
        return Ok(ExitCode::FAILURE);
    }

    // the greeting is already out; store outcomes are only traced
    let records = pending.0.take();
    for record in records {
        let document = match service.create_record(&record).await {
            Ok(document) => document,
            Err(CreateRecordError::Provisioning(err)) => {
                tracing::error!(error = %format!("{err:#}"), "store provisioning failed; sign-up not persisted");
                continue;
            }
            Err(CreateRecordError::Write(_)) => continue,
        };
        match StoredSignup::from_document(document) {
            Ok(stored) => tracing::info!(id = %stored.id, etag = ?stored.etag, "sign-up stored"),
            Err(err) => tracing::warn!(%err, "store returned an unexpected document"),
        }
    }
    Ok(ExitCode::SUCCESS)
}
