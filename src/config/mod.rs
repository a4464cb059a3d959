#[cfg(feature = "cli")]
pub mod cli;
pub mod process_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use process_config::ProcessConfig;
