//! Document store client seam, its Cosmos DB and in-memory adapters, and store bootstrapping.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod bootstrap;
pub mod cosmos;
pub mod memory;

pub use bootstrap::ensure_store;
pub use cosmos::CosmosStore;
pub use memory::{MemoryStore, StoreOperation};

/// Throughput (request units) provisioned for every container this crate creates.
pub const PROVISIONED_THROUGHPUT: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKeyKind {
    Hash,
}

/// Partition key declared when a container is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKey {
    pub paths: Vec<String>,
    pub kind: PartitionKeyKind,
}

impl PartitionKey {
    pub fn hash(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            kind: PartitionKeyKind::Hash,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.paths.first().map(String::as_str)
    }

    /// Resolves the routing value of `document` by walking the key path, e.g. `/region`.
    pub fn value_for<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let path = self.path()?;
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(document, |node, segment| node.get(segment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    pub id: String,
    #[serde(rename = "partitionKey")]
    pub partition_key: PartitionKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseResponse {
    pub id: String,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerResponse {
    pub definition: ContainerDefinition,
    pub created: bool,
}

/// Where sign-up documents are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTarget {
    pub database_id: String,
    pub container_id: String,
    pub partition_key: PartitionKey,
    pub throughput: u32,
}

impl StoreTarget {
    pub fn new(
        database_id: impl Into<String>,
        container_id: impl Into<String>,
        partition_key: PartitionKey,
    ) -> Self {
        Self {
            database_id: database_id.into(),
            container_id: container_id.into(),
            partition_key,
            throughput: PROVISIONED_THROUGHPUT,
        }
    }

    pub fn container_definition(&self) -> ContainerDefinition {
        ContainerDefinition {
            id: self.container_id.clone(),
            partition_key: self.partition_key.clone(),
        }
    }
}

/// The store operations the sign-up flow depends on.
///
/// Both `create_*_if_not_exists` calls must be idempotent: calling them for a
/// resource that already exists succeeds with `created == false`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_database_if_not_exists(&self, database_id: &str) -> Result<DatabaseResponse>;

    async fn create_container_if_not_exists(
        &self,
        database_id: &str,
        definition: &ContainerDefinition,
        offer_throughput: u32,
    ) -> Result<ContainerResponse>;

    /// Inserts `document` and returns the stored resource, including any
    /// store-assigned fields such as `id`.
    async fn create_item(
        &self,
        database_id: &str,
        container_id: &str,
        document: Value,
    ) -> Result<Value>;
}

/// Handle to one database of a store.
#[derive(Clone, Copy)]
pub struct DatabaseRef<'a> {
    store: &'a dyn DocumentStore,
    id: &'a str,
}

impl<'a> DatabaseRef<'a> {
    pub fn new(store: &'a dyn DocumentStore, id: &'a str) -> Self {
        Self { store, id }
    }

    pub fn container(&self, id: &'a str) -> ContainerRef<'a> {
        ContainerRef {
            store: self.store,
            database_id: self.id,
            id,
        }
    }

    pub async fn create_container_if_not_exists(
        &self,
        definition: &ContainerDefinition,
        offer_throughput: u32,
    ) -> Result<ContainerResponse> {
        self.store
            .create_container_if_not_exists(self.id, definition, offer_throughput)
            .await
    }
}

/// Handle to one container of a database.
#[derive(Clone, Copy)]
pub struct ContainerRef<'a> {
    store: &'a dyn DocumentStore,
    database_id: &'a str,
    id: &'a str,
}

impl ContainerRef<'_> {
    pub async fn create_item(&self, document: Value) -> Result<Value> {
        self.store
            .create_item(self.database_id, self.id, document)
            .await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
