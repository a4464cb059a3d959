pub mod context;
pub mod registry;

pub use crate::core::context::{InputContext, OutputContext};
pub use crate::core::registry::{Capability, Component, Lifetime, Registry};
pub use crate::domain::model::{Connection, Endpoint, Entity, Process, Record, Server};
pub use crate::domain::ports::{Connector, Query, Session};
pub use crate::utils::error::Result;
