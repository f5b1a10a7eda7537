pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;

pub use cli::{Cli, Commands, OutputFormat, ShellArg};
pub use commands::{check_ports, CommandHandler};
pub use config::{ConfigManager, RetrySettings, TomodoConfig};
pub use error::{CliError, Result};
