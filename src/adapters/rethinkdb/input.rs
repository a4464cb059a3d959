//! Input side of the provider.
//!
//! RethinkDB is write-only here, so every input capability is the inert
//! variant. Callers still resolve them like any other provider's.

use crate::core::context::InputContext;
use crate::domain::model::{Entity, Record};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone)]
pub enum SchemaReader {
    /// 不支援結構探查
    Null,
}

impl SchemaReader {
    pub fn read(&self) -> Schema {
        match self {
            SchemaReader::Null => Schema::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        false
    }
}

/// 版本偵測與讀取
#[derive(Debug, Clone)]
pub enum InputProvider {
    Null,
}

impl InputProvider {
    pub fn max_version(&self) -> Option<serde_json::Value> {
        match self {
            InputProvider::Null => None,
        }
    }

    pub fn read(&self) -> Vec<Record> {
        match self {
            InputProvider::Null => Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub enum Reader {
    Null {
        context: Arc<InputContext>,
        log: bool,
    },
}

impl Reader {
    pub fn read(&self) -> Vec<Record> {
        match self {
            Reader::Null { context, log } => {
                if *log {
                    tracing::debug!(
                        "No data available for entity '{}'",
                        context.entity.name
                    );
                }
                Vec::new()
            }
        }
    }

    pub fn context(&self) -> &InputContext {
        match self {
            Reader::Null { context, .. } => context.as_ref(),
        }
    }

    pub fn logs_empty_reads(&self) -> bool {
        match self {
            Reader::Null { log, .. } => *log,
        }
    }

    pub fn is_active(&self) -> bool {
        false
    }
}
