// Adapters layer: concrete providers that plug into the registry.

pub mod rethinkdb;
