use crate::utils::logger::LogFormat;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "rethinkdb-bind")]
#[command(about = "Show how a process binds to the RethinkDB provider")]
pub struct CliConfig {
    #[arg(long, short, help = "Process definition (TOML)")]
    pub config: String,

    #[arg(long, help = "Override the process mode, e.g. 'init'")]
    pub mode: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, help = "Log format on stderr")]
    #[serde(skip)]
    pub log_format: LogFormat,
}
