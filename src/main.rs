//! procsnap - version 0.1.0
//!
//! Command-line front end for the procsnap library with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;
mod config;

use clap::{Parser, ValueEnum};
use tracing::{debug, info, Level};

use cli::{Args, Commands, LogLevel, OutputFormat};
use commands::{
    command_check, command_config, command_limits, command_meminfo, command_ps, command_show,
};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Effective log level: CLI flag, then config file, then info.
fn effective_log_level(config: &Config, args: &Args) -> LogLevel {
    args.log_level
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s, true).ok())
        })
        .unwrap_or(LogLevel::Info)
}

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config, args: &Args) {
    let level = effective_log_level(config, args);
    if level == LogLevel::Off {
        return;
    }

    let log_level = match level {
        LogLevel::Off | LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    // Config generation must work even when the current config is broken
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), format.clone(), *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);
    info!("Using proc root {}", config.proc_root().display());

    match &args.command {
        None => command_ps(OutputFormat::Text, false, &config),
        Some(Commands::Ps { format, long }) => command_ps(*format, *long, &config),
        Some(Commands::Show {
            pid,
            pid_file,
            format,
        }) => command_show(*pid, pid_file.clone(), *format, &config),
        Some(Commands::Limits { pid, format }) => command_limits(*pid, *format, &config),
        Some(Commands::Meminfo { format }) => command_meminfo(*format, &config),
        Some(Commands::Check { processes }) => command_check(*processes, &config),
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
    }
}
