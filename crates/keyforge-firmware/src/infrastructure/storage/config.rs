//! TOML configuration for the firmware simulator.
//!
//! ```toml
//! [controller]
//! total_keys = 4
//! max_injection_depth = 8
//! log_level = "info"
//!
//! [keymap]
//! layers = [
//!     ["LSHIFT", "A", "SHIFT(1)", "LOCK(1)"],
//!     ["___",    "1", "___",      "___"],
//! ]
//!
//! [[remap]]
//! from = "CAPS"
//! to = "ESC"
//!
//! [simulation]
//! scan_interval_ms = 10
//!
//! [[simulation.steps]]
//! press = [1]
//!
//! [[simulation.steps]]
//! release = [1]
//! ```
//!
//! Fields annotated with `#[serde(default = "some_fn")]` fall back to
//! `some_fn()` when absent, so a partial file is always valid.

use std::path::{Path, PathBuf};

use keyforge_core::KeyParseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    application::{
        controller::{ControllerSettings, DEFAULT_MAX_INJECTION_DEPTH},
        plugins::KeyRemap,
    },
    infrastructure::keymap::{KeymapError, LayeredKeymap},
};

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid keymap: {0}")]
    Keymap(#[from] KeymapError),

    #[error("invalid remap entry: {0}")]
    Remap(#[from] KeyParseError),

    /// Keymap layers do not match `controller.total_keys`.
    #[error("keymap layers have {found} keys but total_keys is {expected}")]
    KeyCount { expected: usize, found: usize },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level firmware configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FirmwareConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub keymap: KeymapConfig,
    #[serde(default)]
    pub remap: Vec<RemapEntry>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Controller parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// Number of physical switches.
    #[serde(default = "default_total_keys")]
    pub total_keys: u16,
    /// Cap on nested plugin injections.
    #[serde(default = "default_max_injection_depth")]
    pub max_injection_depth: u8,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Keymap layers as key names; layer 0 is the base layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeymapConfig {
    #[serde(default = "default_layers")]
    pub layers: Vec<Vec<String>>,
}

/// One entry of the remap plugin's table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemapEntry {
    pub from: String,
    pub to: String,
}

/// Script the simulator replays, one step per scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    #[serde(default = "default_steps")]
    pub steps: Vec<ScanStep>,
}

/// Switches that change before one scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScanStep {
    #[serde(default)]
    pub press: Vec<u16>,
    #[serde(default)]
    pub release: Vec<u16>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_total_keys() -> u16 {
    8
}
fn default_max_injection_depth() -> u8 {
    DEFAULT_MAX_INJECTION_DEPTH
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_layers() -> Vec<Vec<String>> {
    let base = ["LSHIFT", "A", "B", "C", "SPC", "ENTER", "SHIFT(1)", "LOCK(1)"];
    let raise = ["___", "1", "2", "3", "___", "___", "___", "___"];
    [base.as_slice(), raise.as_slice()]
        .iter()
        .map(|layer| layer.iter().map(|name| name.to_string()).collect())
        .collect()
}
fn default_scan_interval_ms() -> u64 {
    10
}
fn default_steps() -> Vec<ScanStep> {
    let step = |press: &[u16], release: &[u16]| ScanStep {
        press: press.to_vec(),
        release: release.to_vec(),
    };
    vec![
        step(&[1], &[]),
        step(&[], &[1]),
        step(&[0], &[]),
        step(&[2], &[]),
        step(&[], &[2]),
        step(&[], &[0]),
        step(&[6], &[]),
        step(&[1], &[]),
        step(&[], &[1, 6]),
    ]
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            total_keys: default_total_keys(),
            max_injection_depth: default_max_injection_depth(),
            log_level: default_log_level(),
        }
    }
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            layers: default_layers(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval_ms(),
            steps: default_steps(),
        }
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

impl FirmwareConfig {
    pub fn settings(&self) -> ControllerSettings {
        ControllerSettings {
            total_keys: self.controller.total_keys,
            max_injection_depth: self.controller.max_injection_depth,
        }
    }

    /// Parses the keymap layers and checks them against `total_keys`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Keymap`] for unparsable or inconsistent layers
    /// and [`ConfigError::KeyCount`] if the layer width is wrong.
    pub fn build_keymap(&self) -> Result<LayeredKeymap, ConfigError> {
        let keymap = LayeredKeymap::from_names(self.keymap.layers.as_slice())?;
        let expected = usize::from(self.controller.total_keys);
        if keymap.key_count() != expected {
            return Err(ConfigError::KeyCount {
                expected,
                found: keymap.key_count(),
            });
        }
        Ok(keymap)
    }

    /// Builds the remap plugin, or `None` if no entries are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Remap`] if a key name does not parse.
    pub fn build_remap(&self) -> Result<Option<KeyRemap>, ConfigError> {
        if self.remap.is_empty() {
            return Ok(None);
        }
        let pairs: Vec<(&str, &str)> = self
            .remap
            .iter()
            .map(|entry| (entry.from.as_str(), entry.to.as_str()))
            .collect();
        Ok(Some(KeyRemap::from_names(&pairs)?))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `FirmwareConfig` from `path`, returning the default if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FirmwareConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FirmwareConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &FirmwareConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
