use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use rethinkdb_bind::adapters::rethinkdb::{
    InputProvider, OutputController, Reader, SchemaReader, Writer,
};
use rethinkdb_bind::core::{Connector, Endpoint, Session};
use rethinkdb_bind::utils::{logger, validation::Validate};
use rethinkdb_bind::{CliConfig, ConnectionFactory, EtlError, ProcessConfig, Registry, RethinkDbModule};
use std::sync::Arc;

/// The CLI only prints the binding plan and never talks to a node.
struct PlanOnlyConnector;

#[async_trait]
impl Connector for PlanOnlyConnector {
    async fn connect(&self, endpoint: &Endpoint) -> rethinkdb_bind::Result<Box<dyn Session>> {
        Err(EtlError::ConnectionError {
            endpoint: endpoint.to_string(),
            message: "sessions are not opened when printing a plan".to_string(),
        })
    }
}

fn describe<T>(result: rethinkdb_bind::Result<T>, show: impl FnOnce(T) -> String) -> String {
    match result {
        Ok(value) => show(value),
        Err(e) => format!("unresolved ({})", e),
    }
}

fn status(active: bool) -> String {
    let label = if active { "active" } else { "null" };
    label.to_string()
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.log_format);

    tracing::info!("Starting rethinkdb-bind");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let process_config = ProcessConfig::from_file(&config.config)
        .with_context(|| format!("failed to load {}", config.config))?;
    if let Err(e) = process_config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e.into());
    }

    let mut process = process_config.into_process();
    if let Some(mode) = &config.mode {
        tracing::info!("Overriding mode '{}' with '{}'", process.mode, mode);
        process.mode = mode.clone();
    }

    let mut registry = Registry::new();
    registry.register_contexts(&process);
    registry.set_process(process.clone());

    RethinkDbModule::new(Arc::new(PlanOnlyConnector))
        .with_read_logging(config.verbose)
        .load(&mut registry)
        .context("failed to register rethinkdb components")?;

    println!("Process '{}' (mode: {})", process.name, process.mode);

    println!("Connection factories:");
    for key in registry.registered_keys::<Arc<ConnectionFactory>>() {
        let factory = registry.resolve_named::<Arc<ConnectionFactory>>(&key);
        println!("  {}: {}", key, describe(factory, |f| f.describe()));
    }

    println!("Entities:");
    for entity in &process.entities {
        println!("  {} ({})", entity.key, entity.name);

        if registry.is_registered::<Reader>(&entity.key) {
            let schema = registry.resolve_named::<SchemaReader>(&entity.key);
            let input = registry.resolve_named::<InputProvider>(&entity.key);
            let reader = registry.resolve_named::<Reader>(&entity.key);
            println!(
                "    input: schema reader {}, input provider {}, reader {}",
                describe(schema, |s| status(s.is_active())),
                describe(input, |i| status(i.is_active())),
                describe(reader, |r| status(r.is_active())),
            );
        }

        if registry.is_registered::<Writer>(&entity.key) {
            let controller = registry.resolve_named::<OutputController>(&entity.key);
            let writer = registry.resolve_named::<Writer>(&entity.key);
            println!(
                "    output: controller {}, writer {}",
                describe(controller, |c| match c {
                    OutputController::RethinkDb(c) if c.initializer().is_noop() =>
                        "rethinkdb (no initializer)".to_string(),
                    OutputController::RethinkDb(_) => "rethinkdb (table initializer)".to_string(),
                    OutputController::Null => "null".to_string(),
                }),
                describe(writer, |w| w.factory().describe()),
            );
        }
    }

    tracing::info!("✅ Binding plan complete");
    Ok(())
}
