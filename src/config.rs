//! Configuration management for procsnap.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use procsnap::process::{NameFilter, ScanOptions};
use procsnap::DEFAULT_PROC_ROOT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default config file locations, searched in order.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/procsnap/procsnap.yaml",
    "/etc/procsnap/procsnap.yml",
    "/etc/procsnap/procsnap.json",
    "/etc/procsnap/procsnap.toml",
    "./procsnap.yaml",
    "./procsnap.yml",
    "./procsnap.json",
    "./procsnap.toml",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Effective configuration. Every field is optional; unset fields fall back
/// to built-in defaults when used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Mount point of the proc filesystem
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Scanning
    /// Preload stat, limits, loginuid and sessionid during scans
    pub eager: Option<bool>,
    pub parallelism: Option<usize>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,
    #[serde(alias = "include-names")]
    pub include_names: Option<Vec<String>>,
    #[serde(alias = "exclude-names")]
    pub exclude_names: Option<Vec<String>>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            eager: Some(false),
            parallelism: None,
            max_processes: None,
            include_names: None,
            exclude_names: None,
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    /// Scan options derived from this config, without a cancel token.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            eager: self.eager.unwrap_or(false),
            parallelism: self.parallelism,
            max_processes: self.max_processes,
            filter: NameFilter {
                include_names: self.include_names.clone(),
                exclude_names: self.exclude_names.clone(),
            },
            cancel: None,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(root) = &cfg.proc_root {
        if root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("proc_root must not be empty".into()));
        }
    }

    if cfg.max_processes == Some(0) {
        return Err(ConfigError::Invalid(
            "max_processes must be greater than 0 when set".into(),
        ));
    }

    if cfg.parallelism == Some(0) {
        return Err(ConfigError::Invalid(
            "parallelism must be greater than 0 when set".into(),
        ));
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                    other
                )));
            }
        }
    }

    Ok(())
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if args.eager {
        config.eager = Some(true);
    }
    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }
    if let Some(max) = args.max_processes {
        config.max_processes = Some(max);
    }

    // Parse comma-separated include/exclude names
    if let Some(include_str) = &args.include_names {
        config.include_names = Some(split_names(include_str));
    }
    if let Some(exclude_str) = &args.exclude_names {
        config.exclude_names = Some(split_names(exclude_str));
    }

    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    Ok(config)
}

/// Loads a config file, or the first existing default location when `path`
/// is `None`. Nothing found means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.clone(),
            source,
        })?,
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.clone(),
            source,
        })?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders a config in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["procsnap"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_yaml_config() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("procsnap.yaml");
        fs::write(
            &path,
            "proc_root: /host/proc\neager: true\nexclude_names:\n  - kworker\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.proc_root, Some(PathBuf::from("/host/proc")));
        assert_eq!(cfg.eager, Some(true));
        assert_eq!(cfg.exclude_names, Some(vec!["kworker".to_string()]));
        assert_eq!(cfg.max_processes, None);
    }

    #[test]
    fn test_load_json_and_toml_config() {
        let dir = tempdir().expect("Failed to create temp dir");

        let json = dir.path().join("procsnap.json");
        fs::write(&json, r#"{"parallelism": 4, "max-processes": 100}"#).unwrap();
        let cfg = load_config(Some(&json)).unwrap();
        assert_eq!(cfg.parallelism, Some(4));
        assert_eq!(cfg.max_processes, Some(100));

        let toml_path = dir.path().join("procsnap.toml");
        fs::write(&toml_path, "log_level = \"debug\"\n").unwrap();
        let cfg = load_config(Some(&toml_path)).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "eager: [not, a, bool").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let err = load_config(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    // -------------------------------------------------------------------------
    // Precedence and validation
    // -------------------------------------------------------------------------

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("procsnap.yaml");
        fs::write(&path, "proc_root: /host/proc\nmax_processes: 10\n").unwrap();
        let path_str = path.to_str().unwrap();

        let cfg = resolve_config(&args(&[
            "--config",
            path_str,
            "--max-processes",
            "5",
            "--include-names",
            "nginx, postgres",
        ]))
        .unwrap();

        assert_eq!(cfg.proc_root, Some(PathBuf::from("/host/proc")));
        assert_eq!(cfg.max_processes, Some(5));
        assert_eq!(
            cfg.include_names,
            Some(vec!["nginx".to_string(), "postgres".to_string()])
        );
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let cfg = resolve_config(&args(&["--no-config"])).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.proc_root(), PathBuf::from("/proc"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(validate_effective_config(&Config::default()).is_ok());

        let cfg = Config {
            proc_root: Some(PathBuf::new()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            max_processes: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_scan_options_from_config() {
        let cfg = Config {
            eager: Some(true),
            parallelism: Some(2),
            exclude_names: Some(vec!["kthreadd".into()]),
            ..Config::default()
        };
        let opts = cfg.scan_options();
        assert!(opts.eager);
        assert_eq!(opts.parallelism, Some(2));
        assert!(!opts.filter.should_include("kthreadd"));
        assert!(opts.cancel.is_none());
    }

    #[test]
    fn test_render_round_trips_yaml() {
        let cfg = Config::default();
        let yaml = render_config(&cfg, &ConfigFormat::Yaml).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, cfg);
    }
}
