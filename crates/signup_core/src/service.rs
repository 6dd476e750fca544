use std::sync::Arc;

use serde_json::Value;
use shared::domain::SignupRecord;
use storage::{ensure_store, DatabaseRef, DocumentStore, StoreTarget};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum CreateRecordError {
    #[error("store provisioning failed: {0:#}")]
    Provisioning(anyhow::Error),
    #[error("store write failed: {0:#}")]
    Write(anyhow::Error),
}

/// Inserts one sign-up document. The store assigns the `id`.
///
/// Failures are traced here and returned; nothing is retried.
pub async fn insert_record(
    store: &dyn DocumentStore,
    target: &StoreTarget,
    record: &SignupRecord,
) -> Result<Value, CreateRecordError> {
    let document = serde_json::to_value(record)
        .map_err(|err| CreateRecordError::Write(anyhow::Error::new(err)))?;

    let created = DatabaseRef::new(store, &target.database_id)
        .container(&target.container_id)
        .create_item(document)
        .await;
    match created {
        Ok(stored) => {
            let id = stored.get("id").and_then(Value::as_str).unwrap_or_default();
            info!(
                id,
                container_id = %target.container_id,
                "created sign-up document"
            );
            Ok(stored)
        }
        Err(err) => {
            error!(
                error = %format!("{err:#}"),
                container_id = %target.container_id,
                "failed to create sign-up document"
            );
            Err(CreateRecordError::Write(err))
        }
    }
}

/// The create-record pathway: ensure the store exists, then insert.
///
/// Holds one long-lived store handle for the life of the process.
#[derive(Clone)]
pub struct SignupService {
    store: Arc<dyn DocumentStore>,
    target: StoreTarget,
}

impl SignupService {
    pub fn new(store: Arc<dyn DocumentStore>, target: StoreTarget) -> Self {
        Self { store, target }
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    /// Runs bootstrap on every call; it is idempotent.
    pub async fn create_record(&self, record: &SignupRecord) -> Result<Value, CreateRecordError> {
        ensure_store(self.store.as_ref(), &self.target)
            .await
            .map_err(CreateRecordError::Provisioning)?;
        insert_record(self.store.as_ref(), &self.target, record).await
    }

    /// Fire-and-forget variant used behind the form: outcomes end up in the log only.
    pub async fn persist(&self, record: SignupRecord) {
        match self.create_record(&record).await {
            Ok(_) => {}
            Err(CreateRecordError::Provisioning(err)) => {
                error!(
                    error = %format!("{err:#}"),
                    database_id = %self.target.database_id,
                    container_id = %self.target.container_id,
                    "store provisioning failed; sign-up not persisted"
                );
            }
            // already traced by insert_record
            Err(CreateRecordError::Write(_)) => {}
        }
    }
}
