//! Azure Cosmos DB (SQL API) adapter speaking the REST protocol with master-key auth.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::{
    ContainerDefinition, ContainerResponse, DatabaseResponse, DocumentStore, PartitionKey,
};

const API_VERSION: &str = "2018-12-31";

/// Builds the URL-encoded `authorization` header value for one request.
///
/// `date` is the exact `x-ms-date` header value; it is lower-cased for signing.
pub fn authorization_token(
    key: &[u8],
    verb: &Method,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.as_str().to_ascii_lowercase(),
        resource_type.to_ascii_lowercase(),
        resource_link,
        date.to_ascii_lowercase()
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|err| anyhow!("invalid master key: {err}"))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    let token = format!("type=master&ver=1.0&sig={signature}");
    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}

/// RFC 1123 timestamp in the form the service expects for `x-ms-date`.
pub fn request_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

struct CosmosRequest<'a> {
    method: Method,
    resource_type: &'a str,
    resource_link: &'a str,
    path: &'a str,
    body: Option<&'a Value>,
    headers: Vec<(&'static str, String)>,
}

#[derive(Clone)]
pub struct CosmosStore {
    http: Client,
    endpoint: Url,
    key: Vec<u8>,
    // container link -> partition key, filled by container reads and creates
    partition_keys: Arc<RwLock<HashMap<String, PartitionKey>>>,
}

impl CosmosStore {
    /// `key` is the base64 account master key as shown in the portal.
    pub fn new(endpoint: &str, key: &str) -> Result<Self> {
        Self::with_client(Client::new(), endpoint, key)
    }

    pub fn with_client(http: Client, endpoint: &str, key: &str) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint.trim())
            .with_context(|| format!("invalid store endpoint '{endpoint}'"))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let key = STANDARD
            .decode(key.trim())
            .context("store key is not valid base64")?;

        Ok(Self {
            http,
            endpoint,
            key,
            partition_keys: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn remember_partition_key(&self, link: &str, partition_key: &PartitionKey) {
        self.partition_keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(link.to_string(), partition_key.clone());
    }

    fn forget_partition_key(&self, link: &str) {
        self.partition_keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(link);
    }

    async fn partition_key_for(&self, link: &str) -> Result<PartitionKey> {
        let cached = self
            .partition_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(link)
            .cloned();
        if let Some(partition_key) = cached {
            return Ok(partition_key);
        }

        let response = self
            .send(CosmosRequest {
                method: Method::GET,
                resource_type: "colls",
                resource_link: link,
                path: link,
                body: None,
                headers: Vec::new(),
            })
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, "read container").await);
        }
        let definition: ContainerDefinition = response
            .json()
            .await
            .context("failed to decode container resource")?;
        self.remember_partition_key(link, &definition.partition_key);
        Ok(definition.partition_key)
    }

    async fn send(&self, request: CosmosRequest<'_>) -> Result<Response> {
        let url = self
            .endpoint
            .join(request.path)
            .with_context(|| format!("failed to build url for '{}'", request.path))?;
        let date = request_date();
        let token = authorization_token(
            &self.key,
            &request.method,
            request.resource_type,
            request.resource_link,
            &date,
        )?;

        debug!(method = %request.method, %url, "store request");
        let mut builder = self
            .http
            .request(request.method, url)
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        builder
            .send()
            .await
            .with_context(|| format!("store request to '{}' failed", request.path))
    }
}

async fn status_error(response: Response, action: &str) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow!("{action} failed with status {status}: {body}")
}

fn partition_key_header(partition_key: &PartitionKey, document: &Value) -> Result<String> {
    let value = partition_key
        .value_for(document)
        .cloned()
        .unwrap_or_else(|| json!({}));
    serde_json::to_string(&json!([value])).context("failed to encode partition key header")
}

#[async_trait]
impl DocumentStore for CosmosStore {
    async fn create_database_if_not_exists(&self, database_id: &str) -> Result<DatabaseResponse> {
        let link = format!("dbs/{database_id}");
        let existing = self
            .send(CosmosRequest {
                method: Method::GET,
                resource_type: "dbs",
                resource_link: &link,
                path: &link,
                body: None,
                headers: Vec::new(),
            })
            .await?;

        let created = match existing.status() {
            status if status.is_success() => false,
            StatusCode::NOT_FOUND => {
                let body = json!({ "id": database_id });
                let response = self
                    .send(CosmosRequest {
                        method: Method::POST,
                        resource_type: "dbs",
                        resource_link: "",
                        path: "dbs",
                        body: Some(&body),
                        headers: Vec::new(),
                    })
                    .await?;
                match response.status() {
                    status if status.is_success() => true,
                    StatusCode::CONFLICT => false,
                    _ => return Err(status_error(response, "create database").await),
                }
            }
            _ => return Err(status_error(existing, "read database").await),
        };

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
        let database_link = format!("dbs/{database_id}");
        let link = format!("{database_link}/colls/{}", definition.id);
        let existing = self
            .send(CosmosRequest {
                method: Method::GET,
                resource_type: "colls",
                resource_link: &link,
                path: &link,
                body: None,
                headers: Vec::new(),
            })
            .await?;

        let (response, created) = match existing.status() {
            status if status.is_success() => (existing, false),
            StatusCode::NOT_FOUND => {
                let body = serde_json::to_value(definition)
                    .context("failed to encode container definition")?;
                let collections = format!("{database_link}/colls");
                let response = self
                    .send(CosmosRequest {
                        method: Method::POST,
                        resource_type: "colls",
                        resource_link: &database_link,
                        path: &collections,
                        body: Some(&body),
                        headers: vec![("x-ms-offer-throughput", offer_throughput.to_string())],
                    })
                    .await?;
                match response.status() {
                    status if status.is_success() => (response, true),
                    StatusCode::CONFLICT => {
                        // created concurrently; its key may differ, so re-read on insert
                        self.forget_partition_key(&link);
                        return Ok(ContainerResponse {
                            definition: definition.clone(),
                            created: false,
                        });
                    }
                    _ => return Err(status_error(response, "create container").await),
                }
            }
            _ => return Err(status_error(existing, "read container").await),
        };

        let stored: ContainerDefinition = response
            .json()
            .await
            .context("failed to decode container resource")?;
        self.remember_partition_key(&link, &stored.partition_key);
        Ok(ContainerResponse {
            definition: stored,
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
        if !fields.contains_key("id") {
            fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        let link = format!("dbs/{database_id}/colls/{container_id}");
        let partition_key = self.partition_key_for(&link).await?;

        let documents = format!("{link}/docs");
        let response = self
            .send(CosmosRequest {
                method: Method::POST,
                resource_type: "docs",
                resource_link: &link,
                path: &documents,
                body: Some(&document),
                headers: vec![(
                    "x-ms-documentdb-partitionkey",
                    partition_key_header(&partition_key, &document)?,
                )],
            })
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, "create document").await);
        }

        response
            .json()
            .await
            .context("failed to decode created document")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_requests_with_the_master_key_scheme() {
        let key = STANDARD
            .decode("ZmFrZS1tYXN0ZXIta2V5LWZvci10ZXN0cw==")
            .expect("key");
        let token = authorization_token(
            &key,
            &Method::POST,
            "dbs",
            "",
            "Thu, 27 Apr 2017 00:51:12 GMT",
        )
        .expect("token");

        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3D8O3Lvut9N7S9E9G4NZOHW3ERvfp64DB7iBEA6wFO5nQ%3D"
        );
    }

    #[test]
    fn resource_link_is_part_of_the_signature() {
        let key = STANDARD
            .decode("ZmFrZS1tYXN0ZXIta2V5LWZvci10ZXN0cw==")
            .expect("key");
        let token = authorization_token(
            &key,
            &Method::GET,
            "colls",
            "dbs/signups/colls/people",
            "Thu, 27 Apr 2017 00:51:12 GMT",
        )
        .expect("token");

        assert!(token.ends_with("NgPHmKZdkuD7I2Gx0rzYsqzRZadjM977a1MphqZIFPQ%3D"));
    }

    #[test]
    fn partition_key_header_wraps_the_routing_value() {
        let key = PartitionKey::hash("/region");
        let header = partition_key_header(&key, &json!({ "region": "Texas" })).expect("header");
        assert_eq!(header, r#"["Texas"]"#);

        let header = partition_key_header(&key, &json!({ "first": "Ann" })).expect("header");
        assert_eq!(header, "[{}]");
    }

    #[test]
    fn rejects_keys_that_are_not_base64() {
        let err = CosmosStore::new("https://localhost:8081", "not base64!")
            .err()
            .expect("should fail");
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn endpoint_gets_a_trailing_slash() {
        let store = CosmosStore::new("https://localhost:8081/account", "a2V5").expect("store");
        assert_eq!(store.endpoint().as_str(), "https://localhost:8081/account/");
    }
}
