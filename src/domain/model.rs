use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

pub const DEFAULT_PORT: u16 = 28015;
pub const INIT_MODE: &str = "init";
pub const OUTPUT_CONNECTION: &str = "output";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

/// 管線定義：連線、實體與執行模式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub key: String,
    pub name: String,
    pub provider: String,
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub servers: Vec<Server>,
    /// 秒
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_database")]
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: String,
    pub name: String,
    pub alias: Option<String>,
    pub connection: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: Vec<String>,
    pub version: Option<String>,
    #[serde(default = "default_insert_size")]
    pub insert_size: usize,
}

/// 網路端點：IP 位址直接連線，主機名稱留給網路層解析
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Ip(SocketAddr),
    Dns { host: String, port: u16 },
}

impl Endpoint {
    pub fn port(&self) -> u16 {
        match self {
            Endpoint::Ip(addr) => addr.port(),
            Endpoint::Dns { port, .. } => *port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Ip(addr) => write!(f, "{}", addr),
            Endpoint::Dns { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

impl Process {
    /// 輸出連線：名稱為 "output" 的連線
    pub fn output(&self) -> Option<&Connection> {
        self.connection_named(OUTPUT_CONNECTION)
    }

    pub fn connection_named(&self, name: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// 實體所參照的連線
    pub fn connection_of(&self, entity: &Entity) -> Option<&Connection> {
        self.connection_named(&entity.connection)
    }

    pub fn is_init_mode(&self) -> bool {
        self.mode == INIT_MODE
    }
}

impl Entity {
    pub fn table_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

fn default_mode() -> String {
    "default".to_string()
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> u64 {
    100
}

fn default_database() -> String {
    "test".to_string()
}

fn default_primary_key() -> Vec<String> {
    vec!["id".to_string()]
}

fn default_insert_size() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let process: Process = toml::from_str(
            r#"
name = "minimal"

[[connections]]
key = "c1"
name = "output"
provider = "rethinkdb"

[[entities]]
key = "e1"
name = "orders"
connection = "output"
"#,
        )
        .unwrap();

        assert_eq!(process.mode, "default");
        let connection = &process.connections[0];
        assert_eq!(connection.server, "localhost");
        assert_eq!(connection.port, DEFAULT_PORT);
        assert_eq!(connection.request_timeout, 100);
        assert!(connection.servers.is_empty());

        let entity = &process.entities[0];
        assert_eq!(entity.primary_key, vec!["id".to_string()]);
        assert_eq!(entity.insert_size, 100);
        assert_eq!(entity.table_name(), "orders");
    }

    #[test]
    fn test_output_is_connection_named_output() {
        let process: Process = toml::from_str(
            r#"
name = "p"
mode = "init"

[[connections]]
key = "c1"
name = "input"
provider = "sqlserver"

[[connections]]
key = "c2"
name = "output"
provider = "rethinkdb"
"#,
        )
        .unwrap();

        assert_eq!(process.output().map(|c| c.key.as_str()), Some("c2"));
        assert!(process.is_init_mode());
    }

    #[test]
    fn test_alias_overrides_table_name() {
        let entity = Entity {
            key: "e1".to_string(),
            name: "Orders".to_string(),
            alias: Some("orders_v2".to_string()),
            connection: "input".to_string(),
            primary_key: vec!["id".to_string()],
            version: None,
            insert_size: 100,
        };
        assert_eq!(entity.table_name(), "orders_v2");
    }
}
