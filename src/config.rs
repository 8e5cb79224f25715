//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stream engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Fan-out worker threads; 0 lets rayon pick (one per core)
    #[serde(default)]
    pub worker_threads: usize,

    #[serde(default)]
    pub fault_policy: FaultPolicy,

    #[serde(default)]
    pub late_registration: RegistrationPolicy,
}

impl EngineConfig {
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn late_registration(mut self, policy: RegistrationPolicy) -> Self {
        self.late_registration = policy;
        self
    }
}

/// What happens when an indexer or analyzer panics during `put`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Catch the panic, log it and report it; everything else in the `put` completes
    #[default]
    Isolate,
    /// Let the panic unwind out of `put`
    Propagate,
}

impl FromStr for FaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "isolate" => Ok(FaultPolicy::Isolate),
            "propagate" => Ok(FaultPolicy::Propagate),
            other => Err(format!("unknown fault policy: {}", other)),
        }
    }
}

/// Whether indexers/analyzers may be added once ingestion has started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Fail with `RegistrationClosed` after the first `put`
    #[default]
    Reject,
    /// Accept; the registrant applies to puts that start afterwards
    Allow,
}

impl FromStr for RegistrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(RegistrationPolicy::Reject),
            "allow" => Ok(RegistrationPolicy::Allow),
            other => Err(format!("unknown registration policy: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether to emit JSON lines instead of human-readable output
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tributary").join("config.toml")),
            Some(PathBuf::from("/etc/tributary/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Engine overrides
        if let Ok(threads) = std::env::var("TRIBUTARY_WORKER_THREADS") {
            if let Ok(n) = threads.parse() {
                self.engine.worker_threads = n;
            }
        }
        if let Ok(policy) = std::env::var("TRIBUTARY_FAULT_POLICY") {
            match policy.parse() {
                Ok(p) => self.engine.fault_policy = p,
                Err(e) => tracing::warn!("Ignoring TRIBUTARY_FAULT_POLICY: {}", e),
            }
        }
        if let Ok(policy) = std::env::var("TRIBUTARY_LATE_REGISTRATION") {
            match policy.parse() {
                Ok(p) => self.engine.late_registration = p,
                Err(e) => tracing::warn!("Ignoring TRIBUTARY_LATE_REGISTRATION: {}", e),
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("TRIBUTARY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TRIBUTARY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tributary Configuration
#
# Environment variables override these settings:
# - TRIBUTARY_WORKER_THREADS
# - TRIBUTARY_FAULT_POLICY
# - TRIBUTARY_LATE_REGISTRATION
# - TRIBUTARY_LOG_LEVEL
# - TRIBUTARY_LOG_FORMAT

[engine]
# Threads used to fan records out to indexers and analyzers (0 = one per core)
worker_threads = 0

# What to do when an indexer or analyzer panics:
# isolate (catch, log and report) or propagate (unwind out of put)
fault_policy = "isolate"

# Registering indexers/analyzers after the first put:
# reject (return an error) or allow
late_registration = "reject"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.engine.worker_threads, 0);
        assert_eq!(config.engine.fault_policy, FaultPolicy::Isolate);
        assert_eq!(config.engine.late_registration, RegistrationPolicy::Reject);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_default_config_parses() {
        let file = write_config(&generate_default_config());
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.engine.worker_threads, 0);
        assert_eq!(config.engine.fault_policy, FaultPolicy::Isolate);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config() {
        let file = write_config(
            r#"
[engine]
worker_threads = 4
fault_policy = "propagate"

[logging]
format = "json"
"#,
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.engine.worker_threads, 4);
        assert_eq!(config.engine.fault_policy, FaultPolicy::Propagate);
        assert_eq!(config.engine.late_registration, RegistrationPolicy::Reject);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_invalid_policy_is_parse_error() {
        let file = write_config("[engine]\nfault_policy = \"ignore\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("TRIBUTARY_WORKER_THREADS", "3");
        std::env::set_var("TRIBUTARY_LATE_REGISTRATION", "Allow");
        std::env::set_var("TRIBUTARY_FAULT_POLICY", "bogus");

        let config = Config::from_env();

        std::env::remove_var("TRIBUTARY_WORKER_THREADS");
        std::env::remove_var("TRIBUTARY_LATE_REGISTRATION");
        std::env::remove_var("TRIBUTARY_FAULT_POLICY");

        assert_eq!(config.engine.worker_threads, 3);
        assert_eq!(config.engine.late_registration, RegistrationPolicy::Allow);
        // Unparseable values keep the default
        assert_eq!(config.engine.fault_policy, FaultPolicy::Isolate);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("PROPAGATE".parse::<FaultPolicy>(), Ok(FaultPolicy::Propagate));
        assert_eq!("reject".parse::<RegistrationPolicy>(), Ok(RegistrationPolicy::Reject));
        assert!("maybe".parse::<RegistrationPolicy>().is_err());
    }
}
