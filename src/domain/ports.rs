use crate::domain::model::Endpoint;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// 本模組會送出的資料庫操作
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Query {
    DbList,
    DbCreate {
        db: String,
    },
    TableList {
        db: String,
    },
    TableCreate {
        db: String,
        table: String,
        primary_key: Vec<String>,
    },
    TableDrop {
        db: String,
        table: String,
    },
    Insert {
        db: String,
        table: String,
        documents: Vec<serde_json::Value>,
        conflict: String,
    },
    Max {
        db: String,
        table: String,
        field: String,
    },
}

/// Opens sessions against one node. The wire protocol lives behind this seam.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Session>>;
}

#[async_trait]
pub trait Session: Send {
    async fn run(&mut self, query: &Query) -> Result<serde_json::Value>;
}
