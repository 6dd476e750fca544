use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use storage::{ensure_store, CosmosStore, DocumentStore, PartitionKey, StoreTarget};
use tokio::net::TcpListener;

const KEY: &str = "ZmFrZS1tYXN0ZXIta2V5LWZvci10ZXN0cw==";

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
}

#[derive(Default)]
struct FakeCosmos {
    databases: BTreeSet<String>,
    containers: BTreeMap<String, Value>,
    documents: Vec<Value>,
    requests: Vec<RecordedRequest>,
    hide_existing_databases: bool,
    hidden_container_reads: usize,
    fail_documents: bool,
}

type Shared = Arc<Mutex<FakeCosmos>>;

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let mut fake = state.lock().expect("fake lock");
    let path = uri.path().trim_start_matches('/').to_string();
    fake.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
    });
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    let segments: Vec<&str> = path.split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["dbs", db]) => {
            if fake.databases.contains(*db) && !fake.hide_existing_databases {
                (StatusCode::OK, Json(json!({ "id": db })))
            } else {
                (StatusCode::NOT_FOUND, Json(json!({ "code": "NotFound" })))
            }
        }
        ("POST", ["dbs"]) => {
            let id = body["id"].as_str().expect("id").to_string();
            if fake.databases.insert(id.clone()) {
                (StatusCode::CREATED, Json(json!({ "id": id, "_rid": "db-rid" })))
            } else {
                (StatusCode::CONFLICT, Json(json!({ "code": "Conflict" })))
            }
        }
        ("GET", ["dbs", db, "colls", coll]) => {
            if fake.hidden_container_reads > 0 {
                fake.hidden_container_reads -= 1;
                return (StatusCode::NOT_FOUND, Json(json!({ "code": "NotFound" })));
            }
            match fake.containers.get(&format!("{db}/{coll}")) {
                Some(definition) => (StatusCode::OK, Json(definition.clone())),
                None => (StatusCode::NOT_FOUND, Json(json!({ "code": "NotFound" }))),
            }
        }
        ("POST", ["dbs", db, "colls"]) => {
            let key = format!("{db}/{}", body["id"].as_str().expect("id"));
            if fake.containers.contains_key(&key) {
                return (StatusCode::CONFLICT, Json(json!({ "code": "Conflict" })));
            }
            let mut stored = body.clone();
            stored["_rid"] = json!("coll-rid");
            fake.containers.insert(key, stored.clone());
            (StatusCode::CREATED, Json(stored))
        }
        ("POST", ["dbs", _, "colls", _, "docs"]) => {
            if fake.fail_documents {
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "code": "ServiceUnavailable" })),
                );
            }
            let mut stored = body.clone();
            stored["_etag"] = json!("\"etag-1\"");
            stored["_ts"] = json!(1_700_000_000);
            fake.documents.push(stored.clone());
            (StatusCode::CREATED, Json(stored))
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "code": "BadRequest" }))),
    }
}

async fn spawn_fake_cosmos(fake: FakeCosmos) -> (String, Shared) {
    let state = Arc::new(Mutex::new(fake));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().fallback(handle).with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/"), state)
}

fn target() -> StoreTarget {
    StoreTarget::new("signups", "people", PartitionKey::hash("/region"))
}

fn header<'a>(request: &'a RecordedRequest, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn bootstraps_database_and_container_over_rest() {
    let (endpoint, state) = spawn_fake_cosmos(FakeCosmos::default()).await;
    let store = CosmosStore::new(&endpoint, KEY).expect("store");

    let container = ensure_store(&store, &target()).await.expect("ensure");
    assert!(container.created);
    assert_eq!(container.definition.partition_key, PartitionKey::hash("/region"));

    let fake = state.lock().expect("fake lock");
    let calls: Vec<(Method, &str)> = fake
        .requests
        .iter()
        .map(|request| (request.method.clone(), request.path.as_str()))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Method::GET, "dbs/signups"),
            (Method::POST, "dbs"),
            (Method::GET, "dbs/signups/colls/people"),
            (Method::POST, "dbs/signups/colls"),
        ]
    );
    for request in &fake.requests {
        assert!(header(request, "authorization")
            .expect("authorization")
            .starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert_eq!(header(request, "x-ms-version"), Some("2018-12-31"));
        assert!(header(request, "x-ms-date").expect("date").ends_with("GMT"));
    }
    assert_eq!(header(&fake.requests[3], "x-ms-offer-throughput"), Some("400"));
}

#[tokio::test]
async fn second_bootstrap_only_reads() {
    let (endpoint, state) = spawn_fake_cosmos(FakeCosmos::default()).await;
    let store = CosmosStore::new(&endpoint, KEY).expect("store");

    ensure_store(&store, &target()).await.expect("first");
    let second = ensure_store(&store, &target()).await.expect("second");

    assert!(!second.created);
    let fake = state.lock().expect("fake lock");
    let posts = fake
        .requests
        .iter()
        .filter(|request| request.method == Method::POST)
        .count();
    assert_eq!(posts, 2);
    assert_eq!(fake.containers.len(), 1);
}

#[tokio::test]
async fn conflict_on_create_counts_as_existing() {
    let mut fake = FakeCosmos {
        hide_existing_databases: true,
        ..FakeCosmos::default()
    };
    fake.databases.insert("signups".to_string());
    let (endpoint, _state) = spawn_fake_cosmos(fake).await;
    let store = CosmosStore::new(&endpoint, KEY).expect("store");

    let database = store
        .create_database_if_not_exists("signups")
        .await
        .expect("conflict tolerated");
    assert!(!database.created);
}

#[tokio::test]
async fn inserts_documents_with_partition_key_header() {
    let (endpoint, state) = spawn_fake_cosmos(FakeCosmos::default()).await;
    let store = CosmosStore::new(&endpoint, KEY).expect("store");
    ensure_store(&store, &target()).await.expect("ensure");

    let stored = store
        .create_item(
            "signups",
            "people",
            json!({ "first": "Ann", "last": "Lee", "number": "5551234", "region": "Texas" }),
        )
        .await
        .expect("insert");

    assert!(stored["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(stored["_etag"], json!("\"etag-1\""));
    let fake = state.lock().expect("fake lock");
    let insert = fake.requests.last().expect("insert request");
    assert_eq!(insert.path, "dbs/signups/colls/people/docs");
    assert_eq!(
        header(insert, "x-ms-documentdb-partitionkey"),
        Some(r#"["Texas"]"#)
    );
    assert_eq!(fake.documents.len(), 1);
}

#[tokio::test]
async fn container_created_elsewhere_keeps_its_own_partition_key() {
    let mut fake = FakeCosmos {
        hidden_container_reads: 1,
        ..FakeCosmos::default()
    };
    fake.databases.insert("signups".to_string());
    fake.containers.insert(
        "signups/people".to_string(),
        json!({ "id": "people", "partitionKey": { "paths": ["/last"], "kind": "Hash" } }),
    );
    let (endpoint, state) = spawn_fake_cosmos(fake).await;
    let store = CosmosStore::new(&endpoint, KEY).expect("store");

    let container = ensure_store(&store, &target()).await.expect("conflict tolerated");
    assert!(!container.created);

    store
        .create_item(
            "signups",
            "people",
            json!({ "first": "Ann", "last": "Lee", "number": "5551234", "region": "Texas" }),
        )
        .await
        .expect("insert");

    let fake = state.lock().expect("fake lock");
    let calls: Vec<(Method, &str)> = fake
        .requests
        .iter()
        .skip(1)
        .map(|request| (request.method.clone(), request.path.as_str()))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Method::GET, "dbs/signups/colls/people"),
            (Method::POST, "dbs/signups/colls"),
            (Method::GET, "dbs/signups/colls/people"),
            (Method::POST, "dbs/signups/colls/people/docs"),
        ]
    );
    let insert = fake.requests.last().expect("insert request");
    assert_eq!(header(insert, "x-ms-documentdb-partitionkey"), Some(r#"["Lee"]"#));
}

#[tokio::test]
async fn write_failures_carry_status_and_body() {
    let fake = FakeCosmos {
        fail_documents: true,
        ..FakeCosmos::default()
    };
    let (endpoint, _state) = spawn_fake_cosmos(fake).await;
    let store = CosmosStore::new(&endpoint, KEY).expect("store");
    ensure_store(&store, &target()).await.expect("ensure");

    let err = store
        .create_item("signups", "people", json!({ "region": "Texas" }))
        .await
        .expect_err("write should fail");

    let message = err.to_string();
    assert!(message.contains("503"), "{message}");
    assert!(message.contains("ServiceUnavailable"), "{message}");
}
