use crate::adapters::rethinkdb::connection::{build_connection_factory, ConnectionFactory};
use crate::adapters::rethinkdb::input::{InputProvider, Reader, SchemaReader};
use crate::adapters::rethinkdb::output::{
    Initializer, OutputController, OutputProvider, RethinkDbOutputController, TableInitializer,
    Writer,
};
use crate::core::registry::{Lifetime, Registry};
use crate::domain::model::Process;
use crate::domain::ports::Connector;
use crate::utils::error::Result;
use std::sync::Arc;

pub const PROVIDER: &str = "rethinkdb";

/// 將 rethinkdb 的元件註冊到登錄表
///
/// 只處理 provider 為 rethinkdb 的連線與實體，其餘一律略過。
pub struct RethinkDbModule {
    connector: Arc<dyn Connector>,
    log_reads: bool,
}

impl RethinkDbModule {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            log_reads: false,
        }
    }

    /// 讓 reader 在沒有資料時寫 debug 日誌
    pub fn with_read_logging(mut self, enabled: bool) -> Self {
        self.log_reads = enabled;
        self
    }

    pub fn load(&self, registry: &mut Registry) -> Result<()> {
        let Some(process) = registry.process() else {
            tracing::debug!("No process registered, skipping {} module", PROVIDER);
            return Ok(());
        };

        let connections = self.register_connections(registry, &process)?;
        let inputs = self.register_inputs(registry, &process)?;
        let outputs = self.register_outputs(registry, &process)?;

        tracing::info!(
            "{} module loaded: {} connection factories, {} input entities, {} output entities",
            PROVIDER,
            connections,
            inputs,
            outputs
        );
        Ok(())
    }

    fn register_connections(&self, registry: &mut Registry, process: &Process) -> Result<usize> {
        let mut count = 0;

        for connection in process.connections.iter().filter(|c| c.provider == PROVIDER) {
            let key = connection.key.clone();
            let connection = connection.clone();
            let connector = self.connector.clone();

            registry.register_named(&key, Lifetime::SingleInstance, move |_| {
                Ok(Arc::new(build_connection_factory(&connection, connector.clone())))
            })?;
            // the engine also asks for a schema reader per connection
            registry.register_named(&key, Lifetime::PerResolve, |_| Ok(SchemaReader::Null))?;
            count += 1;
        }

        Ok(count)
    }

    fn register_inputs(&self, registry: &mut Registry, process: &Process) -> Result<usize> {
        let mut count = 0;

        let entities = process.entities.iter().filter(|e| {
            process
                .connection_of(e)
                .map(|c| c.provider == PROVIDER)
                .unwrap_or(false)
        });

        for entity in entities {
            let key = entity.key.clone();

            registry.register_named(&key, Lifetime::PerResolve, |_| Ok(SchemaReader::Null))?;
            registry.register_named(&key, Lifetime::PerResolve, |_| Ok(InputProvider::Null))?;

            let context_key = key.clone();
            let log = self.log_reads;
            registry.register_named(&key, Lifetime::PerResolve, move |r| {
                Ok(Reader::Null {
                    context: r.resolve_input_context(&context_key)?,
                    log,
                })
            })?;
            count += 1;
        }

        Ok(count)
    }

    fn register_outputs(&self, registry: &mut Registry, process: &Process) -> Result<usize> {
        let matches = process
            .output()
            .map(|c| c.provider == PROVIDER)
            .unwrap_or(false);
        if !matches {
            return Ok(0);
        }

        registry.register_default_output_controller(OutputController::Null)?;

        // every entity, not only those on a rethinkdb connection
        for entity in &process.entities {
            let key = entity.key.clone();
            let init = process.is_init_mode();

            let controller_key = key.clone();
            registry.register_named(&key, Lifetime::PerResolve, move |r| {
                let input = r.resolve_input_context(&controller_key)?;
                let output = r.resolve_output_context(&controller_key)?;
                let factory = r.resolve_named::<Arc<ConnectionFactory>>(&output.connection.key)?;

                let initializer = if init {
                    Initializer::Table(TableInitializer::new(
                        input.clone(),
                        output.clone(),
                        factory.clone(),
                    ))
                } else {
                    Initializer::Noop
                };

                Ok(OutputController::RethinkDb(RethinkDbOutputController::new(
                    output.clone(),
                    initializer,
                    r.resolve_named::<InputProvider>(&controller_key)?,
                    OutputProvider::new(input, output, factory.clone()),
                    factory,
                )))
            })?;

            let writer_key = key.clone();
            registry.register_named(&key, Lifetime::PerResolve, move |r| {
                let output = r.resolve_output_context(&writer_key)?;
                let factory = r.resolve_named::<Arc<ConnectionFactory>>(&output.connection.key)?;
                Ok(Writer::new(
                    r.resolve_input_context(&writer_key)?,
                    output,
                    factory,
                ))
            })?;
        }

        Ok(process.entities.len())
    }
}
