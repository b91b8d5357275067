//! Shared fixtures for gateway integration tests
//!
//! `FakeTable` answers PostgREST-style requests for one table from memory so
//! tests can exercise full create/read/update/delete sequences.

#![allow(dead_code)]

use fbm_gateway::{BackendSettings, PersistenceGateway};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TEST_KEY: &str = "test-anon-key";
pub const TABLE: &str = "FBM_API";
pub const TABLE_PATH: &str = "/rest/v1/FBM_API";
pub const REST_ROOT_PATH: &str = "/rest/v1/";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("fbm_gateway=debug")
        .try_init();
}

pub fn gateway_for(server: &MockServer) -> PersistenceGateway {
    PersistenceGateway::from_settings(&BackendSettings::new(server.uri(), TEST_KEY))
        .expect("valid settings")
}

/// Answer the handshake probe (a `HEAD` on any table).
pub async fn mount_handshake(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Handshake plus an in-memory table.
pub async fn mount_backend(server: &MockServer) -> FakeTable {
    mount_handshake(server).await;

    let table = FakeTable::new();
    Mock::given(path(TABLE_PATH))
        .respond_with(table.clone())
        .mount(server)
        .await;

    table
}

pub fn row(name: &str, login: &str, password: &str, age: i32) -> Value {
    json!({
        "name": name,
        "login": login,
        "password": password,
        "age": age,
        "created_at": "2024-01-15T08:30:00.000000+00:00"
    })
}

/// All requests the server received with the given method and path.
pub async fn requests_to(server: &MockServer, verb: &str, url_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.to_string() == verb && r.url.path() == url_path)
        .collect()
}

struct TableState {
    rows: Vec<Value>,
    next_id: i64,
}

/// In-memory stand-in for a PostgREST table.
#[derive(Clone)]
pub struct FakeTable {
    state: Arc<Mutex<TableState>>,
}

impl FakeTable {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TableState {
                rows: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Insert a row directly, returning its assigned id.
    pub fn seed(&self, mut row: Value) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        row["id"] = json!(id);
        state.rows.push(row);
        id
    }

    pub fn get(&self, id: i64) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state.rows.iter().find(|r| r["id"] == json!(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }
}

fn id_filter(params: &HashMap<String, String>) -> Option<i64> {
    params
        .get("id")
        .and_then(|v| v.strip_prefix("eq."))
        .and_then(|v| v.parse().ok())
}

fn matches(row: &Value, filter: Option<i64>) -> bool {
    filter.map_or(true, |id| row["id"] == json!(id))
}

impl Respond for FakeTable {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let params: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
        let filter = id_filter(&params);
        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        let mut state = self.state.lock().unwrap();

        match request.method.to_string().as_str() {
            "GET" => {
                let rows: Vec<Value> = state
                    .rows
                    .iter()
                    .filter(|r| matches(r, filter))
                    .take(limit)
                    .cloned()
                    .collect();
                ResponseTemplate::new(200).set_body_json(rows)
            }
            "POST" => {
                let mut row: Value = match serde_json::from_slice(&request.body) {
                    Ok(row) => row,
                    Err(e) => return ResponseTemplate::new(400).set_body_string(e.to_string()),
                };
                row["id"] = json!(state.next_id);
                state.next_id += 1;
                state.rows.push(row.clone());
                ResponseTemplate::new(201).set_body_json(vec![row])
            }
            "PATCH" => {
                let patch: Map<String, Value> = match serde_json::from_slice(&request.body) {
                    Ok(patch) => patch,
                    Err(e) => return ResponseTemplate::new(400).set_body_string(e.to_string()),
                };
                let mut updated = Vec::new();
                for row in state.rows.iter_mut().filter(|r| matches(r, filter)) {
                    for (column, value) in &patch {
                        row[column.as_str()] = value.clone();
                    }
                    updated.push(row.clone());
                }
                ResponseTemplate::new(200).set_body_json(updated)
            }
            "DELETE" => {
                state.rows.retain(|r| !matches(r, filter));
                ResponseTemplate::new(204)
            }
            _ => ResponseTemplate::new(405),
        }
    }
}
