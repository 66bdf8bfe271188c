//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid dimensions and vacancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Fraction of cells left vacant, in [0, 1)
    pub empty_ratio: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            cols: 12,
            empty_ratio: 0.25,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "grid dimensions must be positive, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !(0.0..1.0).contains(&self.empty_ratio) {
            return Err(Error::InvalidConfiguration(format!(
                "empty_ratio must be in [0, 1), got {}",
                self.empty_ratio
            )));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// `floor(rows * cols * empty_ratio)`
    pub fn empty_count(&self) -> usize {
        (self.cell_count() as f64 * self.empty_ratio).floor() as usize
    }

    pub fn agent_count(&self) -> usize {
        self.cell_count() - self.empty_count()
    }
}

/// Everything needed to build and drive one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid layout
    #[serde(default)]
    pub grid: GridConfig,
    /// Minimum same-type neighbour fraction for satisfaction
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Random seed for reproducibility
    #[serde(default)]
    pub seed: u64,
}

fn default_threshold() -> f64 {
    0.33
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            threshold: default_threshold(),
            seed: 0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        validate_threshold(self.threshold)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Thresholds are fractions; NaN is rejected along with anything outside [0, 1].
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::InvalidConfiguration(format!(
            "threshold must be in [0, 1], got {threshold}"
        )));
    }
    Ok(())
}

/// Tick timer owned by the presentation side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between automatic steps while playing (milliseconds)
    pub tick_interval_ms: u64,
    /// Stop playing once a step reports no movement
    pub auto_pause_when_settled: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 800,
            auto_pause_when_settled: true,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
    /// Optional JSON file holding a `SimulationConfig`
    pub simulation_config_path: Option<String>,
    /// Playback timer settings
    pub playback: PlaybackConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            json_logs: false,
            simulation_config_path: None,
            playback: PlaybackConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `SCHELLING_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(address) = lookup("SCHELLING_BIND_ADDRESS") {
            config.bind_address = address;
        }
        if let Some(port) = lookup("SCHELLING_PORT") {
            config.port = port.trim().parse().map_err(|_| {
                Error::InvalidConfiguration(format!("SCHELLING_PORT is not a port: '{port}'"))
            })?;
        }
        if let Some(path) = lookup("SCHELLING_CONFIG") {
            config.simulation_config_path = Some(path);
        }
        if let Some(ms) = lookup("SCHELLING_TICK_MS") {
            config.playback.tick_interval_ms = ms.trim().parse().map_err(|_| {
                Error::InvalidConfiguration(format!("SCHELLING_TICK_MS is not a number: '{ms}'"))
            })?;
        }
        if let Some(flag) = lookup("SCHELLING_JSON_LOGS") {
            config.json_logs = matches!(flag.trim(), "1" | "true" | "yes");
        }

        if config.playback.tick_interval_ms == 0 {
            return Err(Error::InvalidConfiguration(
                "tick interval must be at least 1ms".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn load_simulation_config(&self) -> Result<SimulationConfig> {
        match &self.simulation_config_path {
            Some(path) => SimulationConfig::from_json_file(path),
            None => Ok(SimulationConfig::default()),
        }
    }
}
