use crate::adapters::rethinkdb::{
    ConnectionFactory, InputProvider, OutputController, Reader, SchemaReader, Writer,
};
use crate::core::context::{InputContext, OutputContext};
use crate::domain::model::Process;
use crate::utils::error::{EtlError, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// 可註冊的元件種類，每種各自一個命名空間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ConnectionFactory,
    SchemaReader,
    InputProvider,
    Reader,
    OutputController,
    Writer,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ConnectionFactory => "connection factory",
            Capability::SchemaReader => "schema reader",
            Capability::InputProvider => "input provider",
            Capability::Reader => "reader",
            Capability::OutputController => "output controller",
            Capability::Writer => "writer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// 每次解析都重新建構
    PerResolve,
    /// 第一次解析時建構，之後共用同一個實例
    SingleInstance,
}

type Build<T> = Box<dyn Fn(&Registry) -> Result<T> + Send + Sync>;

struct Binding<T> {
    lifetime: Lifetime,
    build: Build<T>,
    instance: OnceLock<T>,
}

/// One capability's keyed bindings.
pub struct Bindings<T> {
    capability: Capability,
    entries: HashMap<String, Binding<T>>,
}

impl<T: Clone> Bindings<T> {
    fn new(capability: Capability) -> Self {
        Self {
            capability,
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, key: &str, lifetime: Lifetime, build: Build<T>) -> Result<()> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Err(EtlError::DuplicateRegistration {
                capability: self.capability.to_string(),
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Binding {
                    lifetime,
                    build,
                    instance: OnceLock::new(),
                });
                Ok(())
            }
        }
    }

    fn resolve(&self, key: &str, registry: &Registry) -> Result<T> {
        let binding = self
            .entries
            .get(key)
            .ok_or_else(|| EtlError::ResolutionError {
                capability: self.capability.to_string(),
                key: key.to_string(),
            })?;

        match binding.lifetime {
            Lifetime::PerResolve => (binding.build)(registry),
            Lifetime::SingleInstance => {
                if let Some(instance) = binding.instance.get() {
                    return Ok(instance.clone());
                }
                // setup is single-threaded, so the first build wins
                let built = (binding.build)(registry)?;
                Ok(binding.instance.get_or_init(|| built).clone())
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Ties a component type to its slot in the registry.
pub trait Component: Clone + Send + Sync + 'static {
    const CAPABILITY: Capability;

    fn bindings(registry: &Registry) -> &Bindings<Self>;
    fn bindings_mut(registry: &mut Registry) -> &mut Bindings<Self>;
}

macro_rules! component {
    ($ty:ty, $capability:ident, $field:ident) => {
        impl Component for $ty {
            const CAPABILITY: Capability = Capability::$capability;

            fn bindings(registry: &Registry) -> &Bindings<Self> {
                &registry.$field
            }

            fn bindings_mut(registry: &mut Registry) -> &mut Bindings<Self> {
                &mut registry.$field
            }
        }
    };
}

component!(Arc<ConnectionFactory>, ConnectionFactory, connection_factories);
component!(SchemaReader, SchemaReader, schema_readers);
component!(InputProvider, InputProvider, input_providers);
component!(Reader, Reader, readers);
component!(OutputController, OutputController, output_controllers);
component!(Writer, Writer, writers);

/// 元件登錄表：以 (能力, 鍵) 索引，於單次設定流程中填入
pub struct Registry {
    process: Option<Arc<Process>>,
    input_contexts: HashMap<String, Arc<InputContext>>,
    output_contexts: HashMap<String, Arc<OutputContext>>,
    connection_factories: Bindings<Arc<ConnectionFactory>>,
    schema_readers: Bindings<SchemaReader>,
    input_providers: Bindings<InputProvider>,
    readers: Bindings<Reader>,
    output_controllers: Bindings<OutputController>,
    writers: Bindings<Writer>,
    default_output_controller: Option<OutputController>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            process: None,
            input_contexts: HashMap::new(),
            output_contexts: HashMap::new(),
            connection_factories: Bindings::new(Capability::ConnectionFactory),
            schema_readers: Bindings::new(Capability::SchemaReader),
            input_providers: Bindings::new(Capability::InputProvider),
            readers: Bindings::new(Capability::Reader),
            output_controllers: Bindings::new(Capability::OutputController),
            writers: Bindings::new(Capability::Writer),
            default_output_controller: None,
        }
    }

    pub fn set_process(&mut self, process: Process) {
        self.process = Some(Arc::new(process));
    }

    pub fn process(&self) -> Option<Arc<Process>> {
        self.process.clone()
    }

    pub fn register_input_context(&mut self, key: &str, context: InputContext) {
        self.input_contexts
            .insert(key.to_string(), Arc::new(context));
    }

    pub fn register_output_context(&mut self, key: &str, context: OutputContext) {
        self.output_contexts
            .insert(key.to_string(), Arc::new(context));
    }

    /// 依流程為每個實體建立讀寫上下文
    ///
    /// 找不到連線的實體不會得到對應的上下文，之後解析時才會報錯。
    pub fn register_contexts(&mut self, process: &Process) {
        let output = process.output().cloned();

        for entity in &process.entities {
            if let Some(connection) = process.connection_of(entity) {
                self.register_input_context(
                    &entity.key,
                    InputContext {
                        entity: entity.clone(),
                        connection: connection.clone(),
                    },
                );
            }

            if let Some(connection) = &output {
                self.register_output_context(
                    &entity.key,
                    OutputContext {
                        entity: entity.clone(),
                        connection: connection.clone(),
                    },
                );
            }
        }
    }

    pub fn resolve_input_context(&self, key: &str) -> Result<Arc<InputContext>> {
        self.input_contexts
            .get(key)
            .cloned()
            .ok_or_else(|| EtlError::ResolutionError {
                capability: "input context".to_string(),
                key: key.to_string(),
            })
    }

    pub fn resolve_output_context(&self, key: &str) -> Result<Arc<OutputContext>> {
        self.output_contexts
            .get(key)
            .cloned()
            .ok_or_else(|| EtlError::ResolutionError {
                capability: "output context".to_string(),
                key: key.to_string(),
            })
    }

    pub fn register_named<T, F>(&mut self, key: &str, lifetime: Lifetime, build: F) -> Result<()>
    where
        T: Component,
        F: Fn(&Registry) -> Result<T> + Send + Sync + 'static,
    {
        tracing::debug!("Registering {} for '{}' ({:?})", T::CAPABILITY, key, lifetime);
        T::bindings_mut(self).insert(key, lifetime, Box::new(build))
    }

    pub fn resolve_named<T: Component>(&self, key: &str) -> Result<T> {
        T::bindings(self).resolve(key, self)
    }

    pub fn is_registered<T: Component>(&self, key: &str) -> bool {
        T::bindings(self).contains(key)
    }

    /// 已註冊的鍵，排序後回傳
    pub fn registered_keys<T: Component>(&self) -> Vec<String> {
        T::bindings(self).keys()
    }

    pub fn register_default_output_controller(&mut self, controller: OutputController) -> Result<()> {
        if self.default_output_controller.is_some() {
            return Err(EtlError::DuplicateRegistration {
                capability: Capability::OutputController.to_string(),
                key: "<default>".to_string(),
            });
        }
        self.default_output_controller = Some(controller);
        Ok(())
    }

    pub fn default_output_controller(&self) -> Result<OutputController> {
        self.default_output_controller
            .clone()
            .ok_or_else(|| EtlError::ResolutionError {
                capability: Capability::OutputController.to_string(),
                key: "<default>".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry
            .register_named("e1", Lifetime::PerResolve, |_| Ok(SchemaReader::Null))
            .unwrap();

        let err = registry
            .register_named("e1", Lifetime::PerResolve, |_| Ok(SchemaReader::Null))
            .unwrap_err();
        assert!(matches!(err, EtlError::DuplicateRegistration { .. }));

        // same key under another capability is fine
        registry
            .register_named("e1", Lifetime::PerResolve, |_| Ok(InputProvider::Null))
            .unwrap();
    }

    #[test]
    fn test_missing_binding_is_resolution_error() {
        let registry = Registry::new();
        let err = registry.resolve_named::<SchemaReader>("nope").unwrap_err();
        match err {
            EtlError::ResolutionError { capability, key } => {
                assert_eq!(capability, "schema reader");
                assert_eq!(key, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_instance_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();

        let mut registry = Registry::new();
        registry
            .register_named("e1", Lifetime::SingleInstance, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(InputProvider::Null)
            })
            .unwrap();

        for _ in 0..3 {
            registry.resolve_named::<InputProvider>("e1").unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_per_resolve_builds_every_time() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();

        let mut registry = Registry::new();
        registry
            .register_named("e1", Lifetime::PerResolve, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(InputProvider::Null)
            })
            .unwrap();

        registry.resolve_named::<InputProvider>("e1").unwrap();
        registry.resolve_named::<InputProvider>("e1").unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_single_instance_build_is_retried() {
        let mut registry = Registry::new();
        registry
            .register_named("e1", Lifetime::SingleInstance, |r| {
                r.resolve_input_context("e1")?;
                Ok(InputProvider::Null)
            })
            .unwrap();

        assert!(registry.resolve_named::<InputProvider>("e1").is_err());
        assert!(registry.resolve_named::<InputProvider>("e1").is_err());
    }

    #[test]
    fn test_default_output_controller_registered_once() {
        let mut registry = Registry::new();
        assert!(registry.default_output_controller().is_err());

        registry
            .register_default_output_controller(OutputController::Null)
            .unwrap();
        assert!(registry
            .register_default_output_controller(OutputController::Null)
            .is_err());
        assert!(matches!(
            registry.default_output_controller().unwrap(),
            OutputController::Null
        ));
    }
}
