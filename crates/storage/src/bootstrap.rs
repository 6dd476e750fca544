use anyhow::Result;
use tracing::debug;

use crate::{ContainerResponse, DatabaseRef, DocumentStore, StoreTarget};

/// Makes sure the target database and container exist before a write.
///
/// The container is only requested once the database call has resolved.
/// Errors from either step are returned to the caller as-is. Safe to run
/// before every insert: existing resources are left alone.
pub async fn ensure_store(
    store: &dyn DocumentStore,
    target: &StoreTarget,
) -> Result<ContainerResponse> {
    let database = store
        .create_database_if_not_exists(&target.database_id)
        .await?;
    debug!(
        database_id = %database.id,
        created = database.created,
        "database ready"
    );

    let container = DatabaseRef::new(store, &target.database_id)
        .create_container_if_not_exists(&target.container_definition(), target.throughput)
        .await?;
    debug!(
        database_id = %target.database_id,
        container_id = %container.definition.id,
        created = container.created,
        throughput = target.throughput,
        "container ready"
    );

    Ok(container)
}
