use crate::adapters::rethinkdb::connection::ConnectionFactory;
use crate::adapters::rethinkdb::input::InputProvider;
use crate::core::context::{InputContext, OutputContext};
use crate::domain::model::Record;
use crate::domain::ports::Query;
use crate::utils::error::Result;
use std::sync::Arc;

const CONFLICT_STRATEGY: &str = "update";

fn contains_name(listing: &serde_json::Value, name: &str) -> bool {
    listing
        .as_array()
        .map(|items| items.iter().any(|item| item.as_str() == Some(name)))
        .unwrap_or(false)
}

/// 重建輸出資料表：資料庫不存在時建立，資料表存在時先刪除再建立
#[derive(Debug, Clone)]
pub struct TableInitializer {
    input: Arc<InputContext>,
    output: Arc<OutputContext>,
    factory: Arc<ConnectionFactory>,
}

impl TableInitializer {
    pub fn new(
        input: Arc<InputContext>,
        output: Arc<OutputContext>,
        factory: Arc<ConnectionFactory>,
    ) -> Self {
        Self {
            input,
            output,
            factory,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let db = self.output.database().to_string();
        let table = self.output.table().to_string();

        let databases = self.factory.run(&Query::DbList).await?;
        if !contains_name(&databases, &db) {
            tracing::info!("Creating database '{}'", db);
            self.factory.run(&Query::DbCreate { db: db.clone() }).await?;
        }

        let tables = self.factory.run(&Query::TableList { db: db.clone() }).await?;
        if contains_name(&tables, &table) {
            tracing::info!("Dropping table '{}.{}'", db, table);
            self.factory
                .run(&Query::TableDrop {
                    db: db.clone(),
                    table: table.clone(),
                })
                .await?;
        }

        tracing::info!(
            "Creating table '{}.{}' for entity '{}'",
            db,
            table,
            self.input.entity.name
        );
        self.factory
            .run(&Query::TableCreate {
                db,
                table,
                primary_key: self.output.entity.primary_key.clone(),
            })
            .await?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Initializer {
    Noop,
    Table(TableInitializer),
}

impl Initializer {
    pub async fn execute(&self) -> Result<()> {
        match self {
            Initializer::Noop => Ok(()),
            Initializer::Table(initializer) => initializer.execute().await,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Initializer::Noop)
    }
}

/// Reads state back from the output table.
#[derive(Debug, Clone)]
pub struct OutputProvider {
    input: Arc<InputContext>,
    output: Arc<OutputContext>,
    factory: Arc<ConnectionFactory>,
}

impl OutputProvider {
    pub fn new(
        input: Arc<InputContext>,
        output: Arc<OutputContext>,
        factory: Arc<ConnectionFactory>,
    ) -> Self {
        Self {
            input,
            output,
            factory,
        }
    }

    /// 輸出資料表中版本欄位的最大值；實體沒有版本欄位時為 None
    pub async fn max_version(&self) -> Result<Option<serde_json::Value>> {
        let Some(field) = self.input.entity.version.clone() else {
            return Ok(None);
        };

        let value = self
            .factory
            .run(&Query::Max {
                db: self.output.database().to_string(),
                table: self.output.table().to_string(),
                field,
            })
            .await?;

        Ok(if value.is_null() { None } else { Some(value) })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Versions {
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct RethinkDbOutputController {
    output: Arc<OutputContext>,
    initializer: Initializer,
    input_provider: InputProvider,
    output_provider: OutputProvider,
    factory: Arc<ConnectionFactory>,
}

impl RethinkDbOutputController {
    pub fn new(
        output: Arc<OutputContext>,
        initializer: Initializer,
        input_provider: InputProvider,
        output_provider: OutputProvider,
        factory: Arc<ConnectionFactory>,
    ) -> Self {
        Self {
            output,
            initializer,
            input_provider,
            output_provider,
            factory,
        }
    }

    pub fn initializer(&self) -> &Initializer {
        &self.initializer
    }

    pub fn factory(&self) -> &Arc<ConnectionFactory> {
        &self.factory
    }
}

#[derive(Debug, Clone)]
pub enum OutputController {
    Null,
    RethinkDb(RethinkDbOutputController),
}

impl OutputController {
    pub async fn initialize(&self) -> Result<()> {
        match self {
            OutputController::Null => Ok(()),
            OutputController::RethinkDb(controller) => controller.initializer.execute().await,
        }
    }

    /// 比對輸入與輸出的最大版本
    pub async fn start(&self) -> Result<Versions> {
        match self {
            OutputController::Null => Ok(Versions::default()),
            OutputController::RethinkDb(controller) => {
                let versions = Versions {
                    input: controller.input_provider.max_version(),
                    output: controller.output_provider.max_version().await?,
                };
                tracing::debug!(
                    "Entity '{}': input version {:?}, output version {:?}",
                    controller.output.entity.name,
                    versions.input,
                    versions.output
                );
                Ok(versions)
            }
        }
    }

    pub async fn end(&self) -> Result<()> {
        if let OutputController::RethinkDb(controller) = self {
            tracing::info!(
                "Output for entity '{}' complete",
                controller.output.entity.name
            );
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self, OutputController::RethinkDb(_))
    }
}

/// 以 insert_size 分批寫入，主鍵衝突時更新
#[derive(Debug, Clone)]
pub struct Writer {
    input: Arc<InputContext>,
    output: Arc<OutputContext>,
    factory: Arc<ConnectionFactory>,
}

impl Writer {
    pub fn new(
        input: Arc<InputContext>,
        output: Arc<OutputContext>,
        factory: Arc<ConnectionFactory>,
    ) -> Self {
        Self {
            input,
            output,
            factory,
        }
    }

    pub fn factory(&self) -> &Arc<ConnectionFactory> {
        &self.factory
    }

    pub async fn write(&self, rows: Vec<Record>) -> Result<usize> {
        let batch_size = self.output.entity.insert_size.max(1);
        let mut written = 0;

        for batch in rows.chunks(batch_size) {
            let documents = batch
                .iter()
                .map(|record| serde_json::to_value(&record.data))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            self.factory
                .run(&Query::Insert {
                    db: self.output.database().to_string(),
                    table: self.output.table().to_string(),
                    documents,
                    conflict: CONFLICT_STRATEGY.to_string(),
                })
                .await?;

            written += batch.len();
        }

        tracing::debug!(
            "Wrote {} rows from '{}' to '{}.{}'",
            written,
            self.input.entity.name,
            self.output.database(),
            self.output.table()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_name() {
        let listing = serde_json::json!(["test", "orders"]);
        assert!(contains_name(&listing, "orders"));
        assert!(!contains_name(&listing, "customers"));
        assert!(!contains_name(&serde_json::Value::Null, "orders"));
    }

    #[tokio::test]
    async fn test_noop_initializer_does_nothing() {
        let initializer = Initializer::Noop;
        assert!(initializer.is_noop());
        assert!(initializer.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_null_controller_is_inert() {
        let controller = OutputController::Null;
        assert!(!controller.is_active());
        controller.initialize().await.unwrap();
        assert_eq!(controller.start().await.unwrap(), Versions::default());
        controller.end().await.unwrap();
    }
}
