use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tomodo_docker::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "tomodo",
    about = "Manage local MongoDB deployments running in containers",
    version = env!("CARGO_PKG_VERSION"),
    author = "Tomodo Project Team"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the deployments' data directories
    #[arg(long, value_name = "DIR", global = true)]
    pub data_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format (json, table, plain)
    #[arg(long, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Stop the containers of a deployment
    Stop {
        /// Deployment name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Stop every deployment
        #[arg(long)]
        all: bool,
    },

    /// Remove the containers and data of a deployment
    Remove {
        /// Deployment name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Remove every deployment
        #[arg(long)]
        all: bool,
    },

    /// List deployments
    List {
        /// Only list deployments with these labels, e.g. `tomodo-type=sharded,tomodo-group=rs0`
        #[arg(short, long, value_name = "LABELS")]
        filter: Option<String>,
    },

    /// Show the members of a deployment
    Describe {
        /// Deployment name
        name: String,
    },

    /// Check that ports are free on the host
    CheckPorts {
        #[arg(required = true)]
        ports: Vec<u16>,

        /// Host to probe
        #[arg(long, default_value = "localhost")]
        host: String,
    },

    /// Evaluate a command with the database shell of a deployment
    Eval {
        /// Deployment name
        name: String,

        /// Command to evaluate
        command: String,

        /// Shell to use; picked from the server version when omitted
        #[arg(long)]
        shell: Option<ShellArg>,

        /// Serialize the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
    Plain,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
            OutputFormat::Plain => "plain",
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellArg {
    Mongosh,
    Mongo,
}

impl From<ShellArg> for Shell {
    fn from(shell: ShellArg) -> Self {
        match shell {
            ShellArg::Mongosh => Shell::Mongosh,
            ShellArg::Mongo => Shell::Mongo,
        }
    }
}

