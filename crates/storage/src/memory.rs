//! In-process document store used for local runs and tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    ContainerDefinition, ContainerResponse, DatabaseResponse, DocumentStore, PartitionKey,
};

/// One call observed by a [`MemoryStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    CreateDatabase {
        database_id: String,
        created: bool,
    },
    CreateContainer {
        database_id: String,
        container_id: String,
        created: bool,
    },
    CreateItem {
        database_id: String,
        container_id: String,
        id: String,
    },
}

struct MemoryContainer {
    partition_key: PartitionKey,
    throughput: u32,
    documents: Vec<Value>,
}

#[derive(Default)]
struct MemoryState {
    databases: BTreeMap<String, BTreeMap<String, MemoryContainer>>,
    journal: Vec<StoreOperation>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn journal(&self) -> Vec<StoreOperation> {
        self.state().journal.clone()
    }

    pub fn documents(&self, database_id: &str, container_id: &str) -> Vec<Value> {
        self.state()
            .databases
            .get(database_id)
            .and_then(|containers| containers.get(container_id))
            .map(|container| container.documents.clone())
            .unwrap_or_default()
    }

    pub fn database_count(&self) -> usize {
        self.state().databases.len()
    }

    /// Partition key and throughput a container was created with.
    pub fn container_settings(
        &self,
        database_id: &str,
        container_id: &str,
    ) -> Option<(PartitionKey, u32)> {
        self.state()
            .databases
            .get(database_id)
            .and_then(|containers| containers.get(container_id))
            .map(|container| (container.partition_key.clone(), container.throughput))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_database_if_not_exists(&self, database_id: &str) -> Result<DatabaseResponse> {
        let mut state = self.state();
        let created = !state.databases.contains_key(database_id);
        if created {
            state
                .databases
                .insert(database_id.to_string(), BTreeMap::new());
        }
        state.journal.push(StoreOperation::CreateDatabase {
            database_id: database_id.to_string(),
            created,
        });

        Ok(DatabaseResponse {
            id: database_id.to_string(),
            created,
        })
    }

    async fn create_container_if_not_exists(
        &self,
        database_id: &str,
        definition: &ContainerDefinition,
        offer_throughput: u32,
    ) -> Result<ContainerResponse> {
        let mut state = self.state();
        let containers = state
            .databases
            .get_mut(database_id)
            .ok_or_else(|| anyhow!("database '{database_id}' does not exist"))?;

        let (partition_key, created) = match containers.get(&definition.id) {
            Some(existing) => (existing.partition_key.clone(), false),
            None => {
                containers.insert(
                    definition.id.clone(),
                    MemoryContainer {
                        partition_key: definition.partition_key.clone(),
                        throughput: offer_throughput,
                        documents: Vec::new(),
                    },
                );
                (definition.partition_key.clone(), true)
            }
        };
        state.journal.push(StoreOperation::CreateContainer {
            database_id: database_id.to_string(),
            container_id: definition.id.clone(),
            created,
        });

        Ok(ContainerResponse {
            definition: ContainerDefinition {
                id: definition.id.clone(),
                partition_key,
            },
            created,
        })
    }

    async fn create_item(
        &self,
        database_id: &str,
        container_id: &str,
        mut document: Value,
    ) -> Result<Value> {
        let Some(fields) = document.as_object_mut() else {
            bail!("document must be a JSON object");
        };
        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        fields.insert("_ts".to_string(), Value::from(Utc::now().timestamp()));

        let mut state = self.state();
        let container = state
            .databases
            .get_mut(database_id)
            .and_then(|containers| containers.get_mut(container_id))
            .ok_or_else(|| {
                anyhow!("container '{container_id}' does not exist in database '{database_id}'")
            })?;
        if container
            .documents
            .iter()
            .any(|existing| existing.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            bail!("document '{id}' already exists in container '{container_id}'");
        }
        container.documents.push(document.clone());
        state.journal.push(StoreOperation::CreateItem {
            database_id: database_id.to_string(),
            container_id: container_id.to_string(),
            id,
        });

        Ok(document)
    }
}
