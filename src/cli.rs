//! CLI arguments and subcommands for procsnap.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for process data
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procsnap",
    about = "Typed snapshots of Linux processes and memory from /proc",
    long_about = "Typed snapshots of Linux processes and memory from /proc.\n\n\
                  Decodes per-process stat, status, statm, limits, command line, \
                  environment and links, plus system meminfo, into structured records \
                  for auditing and inspection.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Mount point of the proc filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Preload stat, limits, loginuid and sessionid while scanning
    #[arg(long)]
    pub eager: bool,

    /// Worker threads for process scans
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Only include processes whose name contains one of these (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes whose name contains one of these (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List processes
    Ps {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Show the full command line instead of the short name
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Show everything known about one process
    Show {
        /// Process id
        pid: Option<u32>,

        /// Read the pid from a daemon pid file instead
        #[arg(long, conflicts_with = "pid")]
        pid_file: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Show resource limits of one process
    Limits {
        /// Process id
        pid: u32,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show system memory information
    Meminfo {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Verify that the proc filesystem can be decoded
    Check {
        /// Also load every process and report failures
        #[arg(long)]
        processes: bool,
    },

    /// Generate a default configuration file
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
