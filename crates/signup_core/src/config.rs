use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{bail, Context};
use storage::{CosmosStore, DocumentStore, MemoryStore, PartitionKey, StoreTarget};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "signup.toml";

/// Well-known master key of the local Cosmos DB emulator.
const EMULATOR_KEY: &str =
    "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Cosmos,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cosmos" => Ok(Self::Cosmos),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown store backend '{other}' (expected 'cosmos' or 'memory')"),
        }
    }
}

/// Store selection and addressing. Writes stay in memory until
/// `store_backend = "cosmos"` is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_backend: StoreBackend,
    pub endpoint: String,
    pub key: String,
    pub database_id: String,
    pub container_id: String,
    pub partition_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            endpoint: "https://localhost:8081".into(),
            key: EMULATOR_KEY.into(),
            database_id: "signups".into(),
            container_id: "members".into(),
            partition_key: "/region".into(),
        }
    }
}

impl Settings {
    pub fn store_target(&self) -> StoreTarget {
        StoreTarget::new(
            self.database_id.clone(),
            self.container_id.clone(),
            PartitionKey::hash(self.partition_key.clone()),
        )
    }

    /// Applies a flat `key = "value"` TOML table on top of the current values.
    pub fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg = toml::from_str::<HashMap<String, String>>(raw)
            .context("config file must be a flat table of string values")?;
        self.apply(|name| file_cfg.get(name).cloned())
    }

    /// Applies `COSMOS_*` and `APP__*` overrides; `APP__*` wins when both are set.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply(|name| {
            let upper = name.to_ascii_uppercase();
            lookup(&format!("APP__{upper}")).or_else(|| match name {
                "endpoint" => lookup("COSMOS_ENDPOINT"),
                "key" => lookup("COSMOS_KEY"),
                _ => None,
            })
        })
    }

    fn apply<F>(&mut self, value_of: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = value_of("store_backend") {
            self.store_backend = v.parse()?;
        }
        if let Some(v) = value_of("endpoint") {
            self.endpoint = v;
        }
        if let Some(v) = value_of("key") {
            self.key = v;
        }
        if let Some(v) = value_of("database_id") {
            self.database_id = v;
        }
        if let Some(v) = value_of("container_id") {
            self.container_id = v;
        }
        if let Some(v) = value_of("partition_key") {
            self.partition_key = v;
        }
        Ok(())
    }
}

/// Defaults, then the config file, then the process environment.
///
/// An explicit `path` must exist; the default `signup.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (file, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&file) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to parse '{}'", file.display()))?,
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read '{}'", file.display()));
        }
        Err(_) => {}
    }

    settings.apply_env(|name| std::env::var(name).ok())?;
    Ok(settings)
}

/// Builds the process-wide store handle once; callers share it.
pub fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.store_backend {
        StoreBackend::Cosmos => {
            let store = CosmosStore::new(&settings.endpoint, &settings.key)?;
            info!(endpoint = %store.endpoint(), "using cosmos document store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
