#![allow(dead_code)]

use async_trait::async_trait;
use rethinkdb_bind::core::{Connection, Connector, Endpoint, Entity, Process, Query, Session};
use rethinkdb_bind::{EtlError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory stand-in for a RethinkDB node: records every query and answers
/// listings from its own state.
#[derive(Default)]
pub struct MemoryConnector {
    pub databases: Mutex<Vec<String>>,
    pub tables: Mutex<Vec<String>>,
    pub max_version: Mutex<serde_json::Value>,
    pub queries: Arc<Mutex<Vec<Query>>>,
    pub connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn with_state(databases: &[&str], tables: &[&str]) -> Self {
        let connector = Self::default();
        *connector.databases.lock().unwrap() = databases.iter().map(|s| s.to_string()).collect();
        *connector.tables.lock().unwrap() = tables.iter().map(|s| s.to_string()).collect();
        connector
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

struct MemorySession {
    databases: Vec<String>,
    tables: Vec<String>,
    max_version: serde_json::Value,
    queries: Arc<Mutex<Vec<Query>>>,
}

#[async_trait]
impl Session for MemorySession {
    async fn run(&mut self, query: &Query) -> Result<serde_json::Value> {
        self.queries.lock().unwrap().push(query.clone());

        Ok(match query {
            Query::DbList => serde_json::json!(self.databases),
            Query::TableList { .. } => serde_json::json!(self.tables),
            Query::Max { .. } => self.max_version.clone(),
            _ => serde_json::json!({ "ok": 1 }),
        })
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _endpoint: &Endpoint) -> Result<Box<dyn Session>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            databases: self.databases.lock().unwrap().clone(),
            tables: self.tables.lock().unwrap().clone(),
            max_version: self.max_version.lock().unwrap().clone(),
            queries: self.queries.clone(),
        }))
    }
}

/// Never connects.
pub struct DownConnector;

#[async_trait]
impl Connector for DownConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Session>> {
        Err(EtlError::ConnectionError {
            endpoint: endpoint.to_string(),
            message: "connection refused".to_string(),
        })
    }
}

pub fn connection(key: &str, name: &str, provider: &str) -> Connection {
    Connection {
        key: key.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
        server: "localhost".to_string(),
        port: 28015,
        servers: Vec::new(),
        request_timeout: 30,
        database: "etl".to_string(),
    }
}

pub fn entity(key: &str, name: &str, connection: &str) -> Entity {
    Entity {
        key: key.to_string(),
        name: name.to_string(),
        alias: None,
        connection: connection.to_string(),
        primary_key: vec!["id".to_string()],
        version: None,
        insert_size: 100,
    }
}

pub fn process(mode: &str, connections: Vec<Connection>, entities: Vec<Entity>) -> Process {
    Process {
        name: "test-process".to_string(),
        mode: mode.to_string(),
        connections,
        entities,
    }
}
