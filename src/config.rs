//! Configuration management for ca-coproc.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`CA_COPROC_MEM_LATENCY`, `CA_COPROC_TIMEOUT`)
//! 2. Project-local config file (`./ca-coproc.toml`)
//! 3. User config file (`~/.config/ca-coproc/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # ca-coproc.toml
//!
//! # Cycles between a memory request and its ready pulse
//! memory_latency = 10
//!
//! # Give up on an instruction after this many cycles
//! timeout_cycles = 100000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Default external memory latency, in cycles.
pub const DEFAULT_MEMORY_LATENCY: u32 = 10;

/// Default cycle budget per instruction.
pub const DEFAULT_TIMEOUT_CYCLES: u64 = 100_000;

/// ca-coproc configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Latency of the external memory model, in cycles.
    pub memory_latency: Option<u32>,

    /// Cycle budget for a single instruction before the driver gives up.
    pub timeout_cycles: Option<u64>,

    /// Log every intermediate CAR value during evolutions.
    pub trace_evolution: Option<bool>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `ca-coproc.toml`
    /// 3. User config `~/.config/ca-coproc/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        // Environment variables override everything
        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Memory latency, with fallback to the default.
    pub fn memory_latency(&self) -> u32 {
        self.memory_latency.unwrap_or(DEFAULT_MEMORY_LATENCY)
    }

    /// Instruction timeout, with fallback to the default.
    pub fn timeout_cycles(&self) -> u64 {
        self.timeout_cycles.unwrap_or(DEFAULT_TIMEOUT_CYCLES)
    }

    /// Whether evolutions log each pass.
    pub fn trace_evolution(&self) -> bool {
        self.trace_evolution.unwrap_or(false)
    }

    /// Load user configuration from ~/.config/ca-coproc/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./ca-coproc.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new("ca-coproc.toml"))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.memory_latency.is_some() {
            self.memory_latency = other.memory_latency;
        }
        if other.timeout_cycles.is_some() {
            self.timeout_cycles = other.timeout_cycles;
        }
        if other.trace_evolution.is_some() {
            self.trace_evolution = other.trace_evolution;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(latency) = env_number("CA_COPROC_MEM_LATENCY") {
            log::info!("Using CA_COPROC_MEM_LATENCY from environment: {}", latency);
            self.memory_latency = Some(latency);
        }
        if let Some(timeout) = env_number("CA_COPROC_TIMEOUT") {
            log::info!("Using CA_COPROC_TIMEOUT from environment: {}", timeout);
            self.timeout_cycles = Some(timeout);
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ca-coproc").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# ca-coproc configuration
# Place this file at ~/.config/ca-coproc/config.toml or ./ca-coproc.toml

# Cycles between a memory request and its ready pulse (default 10)
memory_latency = 10

# Give up on a single instruction after this many cycles (default 100000)
timeout_cycles = 100000

# Log CAR after every evolution pass at trace level (RUST_LOG=trace)
# trace_evolution = true
"#
        .to_string()
    }
}

/// Parse a numeric environment variable, warning on garbage.
fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}: '{}' is not a number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.memory_latency(), 10);
        assert_eq!(config.timeout_cycles(), 100_000);
        assert!(!config.trace_evolution());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config {
            memory_latency: Some(4),
            timeout_cycles: None,
            trace_evolution: Some(true),
        };

        let overlay = Config {
            memory_latency: None,
            timeout_cycles: Some(500),
            trace_evolution: Some(false),
        };

        base.merge(overlay);

        // memory_latency unchanged (overlay was None)
        assert_eq!(base.memory_latency, Some(4));
        assert_eq!(base.timeout_cycles, Some(500));
        assert_eq!(base.trace_evolution, Some(false));
    }

    #[test]
    fn test_partial_file_parses() {
        let config: Config = toml::from_str("memory_latency = 0\n").unwrap();
        assert_eq!(config.memory_latency(), 0);
        assert_eq!(config.timeout_cycles(), DEFAULT_TIMEOUT_CYCLES);
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = Config::sample_config();
        let config: Config = toml::from_str(&sample).expect("Sample config should parse");
        assert_eq!(config.memory_latency(), DEFAULT_MEMORY_LATENCY);
        assert_eq!(config.timeout_cycles(), DEFAULT_TIMEOUT_CYCLES);
    }
}
