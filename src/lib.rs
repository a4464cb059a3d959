pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::rethinkdb::{ConnectionFactory, RethinkDbModule, PROVIDER};
pub use crate::config::ProcessConfig;
pub use crate::core::{Lifetime, Registry};
pub use crate::utils::error::{EtlError, Result};
