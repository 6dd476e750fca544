//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};
use shared::domain::SignupRecord;
use signup_core::RecordSink;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), UiError> {
    let cmd_name = cmd.name();
    tracing::debug!(command = cmd_name, "queueing ui->backend command");
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            Err(UiError::from_message(
                UiErrorContext::CommandQueue,
                "UI command queue is full",
            ))
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
            Err(UiError::from_message(
                UiErrorContext::CommandQueue,
                "Backend command processor disconnected (possible startup/runtime failure)",
            ))
        }
    }
}

/// Hands validated records to the backend worker without waiting for it.
pub struct ChannelSink {
    cmd_tx: Sender<BackendCommand>,
}

impl ChannelSink {
    pub fn new(cmd_tx: Sender<BackendCommand>) -> Self {
        Self { cmd_tx }
    }
}

impl RecordSink for ChannelSink {
    fn create_record(&self, record: SignupRecord) {
        // the success alert is already up; a lost record only shows in the log
        if let Err(err) =
            dispatch_backend_command(&self.cmd_tx, BackendCommand::CreateRecord { record })
        {
            tracing::error!(error = err.message(), "sign-up record dropped before persistence");
        }
    }
}
