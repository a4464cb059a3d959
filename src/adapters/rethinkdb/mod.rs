//! RethinkDB provider: connection factories, inert input capabilities and
//! the output controller/writer pair, wired into a [`Registry`] by
//! [`RethinkDbModule`].
//!
//! [`Registry`]: crate::core::registry::Registry

pub mod connection;
pub mod endpoint;
pub mod input;
pub mod module;
pub mod output;

pub use connection::{
    build_connection_factory, ConnectionFactory, DefaultConnectionFactory,
    PoolingConnectionFactory, ReliableConnectionFactory,
};
pub use endpoint::resolve_endpoint;
pub use input::{InputProvider, Reader, Schema, SchemaReader};
pub use module::{RethinkDbModule, PROVIDER};
pub use output::{
    Initializer, OutputController, OutputProvider, RethinkDbOutputController, TableInitializer,
    Versions, Writer,
};
