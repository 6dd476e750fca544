//! Runtime bridge between UI command queue and backend event intake.

use std::{thread, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use signup_core::SignupService;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Starts the backend worker thread.
///
/// Every `CreateRecord` runs as its own task: submissions are neither
/// deduplicated nor ordered, and nothing is reported back to the UI.
pub fn launch(
    service: SignupService,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let target = service.target();
        tracing::info!(
            database_id = %target.database_id,
            container_id = %target.container_id,
            "backend worker ready"
        );
        let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));

        let mut in_flight = Vec::new();
        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend command received");
            match cmd {
                BackendCommand::CreateRecord { record } => {
                    let service = service.clone();
                    in_flight.retain(|task: &tokio::task::JoinHandle<()>| !task.is_finished());
                    in_flight.push(runtime.spawn(async move { service.persist(record).await }));
                }
            }
        }

        tracing::info!(
            pending = in_flight.len(),
            "ui command queue closed; stopping backend worker"
        );
        let drained = runtime.block_on(tokio::time::timeout(SHUTDOWN_GRACE, async move {
            for task in in_flight {
                let _ = task.await;
            }
        }));
        if drained.is_err() {
            tracing::warn!("sign-up writes still pending at shutdown were abandoned");
        }
        runtime.shutdown_background();
    })
}
