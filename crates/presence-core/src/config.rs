//! Configuration loading and typed config structures for the presence
//! simulation.
//!
//! The configuration lives in `presence-config.yaml` next to the binary's
//! working directory. Every field has a default, so an empty file (or no
//! file at all) yields a runnable simulation.

use std::path::Path;

use presence_propagation::{
    ConstantSpaceEffect, FlowSpaceEffect, PropagationConfig, PropagationEngine, SpaceEffect,
};
use serde::Deserialize;

use crate::tick::UnknownStatePolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `presence-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Session seeding: rng seed and initial spaces.
    #[serde(default)]
    pub session: SessionConfig,

    /// Tick timing.
    #[serde(default)]
    pub time: TimeConfig,

    /// Propagation constants and strategy selection.
    #[serde(default)]
    pub propagation: PropagationSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Session seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Random seed for reproducible member generation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Spaces created at startup.
    #[serde(default = "default_spaces")]
    pub spaces: Vec<SpaceSeedConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            spaces: default_spaces(),
        }
    }
}

/// One space to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpaceSeedConfig {
    /// Space identifier.
    pub id: String,

    /// Human-readable name (defaults to the id).
    #[serde(default)]
    pub name: Option<String>,

    /// Number of members to generate inside the space.
    #[serde(default = "default_members_per_space")]
    pub members: u32,
}

/// Tick timing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Wall-clock pause between ticks in milliseconds (0 = no pause).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated time delta applied per tick.
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            dt: default_dt(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Which space-effect strategy the engine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceEffectKind {
    /// Every room has `constant_effect`.
    #[default]
    Constant,
    /// A room's effect is the mean of its flow.
    Flow,
}

/// Propagation constants and strategy selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropagationSettings {
    /// Fraction of the energy gap closed per interaction.
    #[serde(default = "default_energy_step")]
    pub energy_step: f64,

    /// Fraction of the attention gap closed per interaction.
    #[serde(default = "default_attention_step")]
    pub attention_step: f64,

    /// Space-effect strategy.
    #[serde(default)]
    pub space_effect: SpaceEffectKind,

    /// Effect used by the constant strategy.
    #[serde(default = "default_constant_effect")]
    pub constant_effect: f64,

    /// What a tick does with a member whose state is unknown.
    #[serde(default)]
    pub unknown_state_policy: UnknownStatePolicy,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            energy_step: default_energy_step(),
            attention_step: default_attention_step(),
            space_effect: SpaceEffectKind::default(),
            constant_effect: default_constant_effect(),
            unknown_state_policy: UnknownStatePolicy::default(),
        }
    }
}

impl PropagationSettings {
    /// The interaction constants.
    pub const fn propagation_config(&self) -> PropagationConfig {
        PropagationConfig {
            energy_step: self.energy_step,
            attention_step: self.attention_step,
        }
    }

    /// Build an engine with the configured strategy.
    pub fn build_engine(&self) -> PropagationEngine<Box<dyn SpaceEffect>> {
        let strategy: Box<dyn SpaceEffect> = match self.space_effect {
            SpaceEffectKind::Constant => Box::new(ConstantSpaceEffect(self.constant_effect)),
            SpaceEffectKind::Flow => Box::new(FlowSpaceEffect),
        };
        PropagationEngine::new(self.propagation_config(), strategy)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

fn default_spaces() -> Vec<SpaceSeedConfig> {
    vec![SpaceSeedConfig {
        id: "commons".to_owned(),
        name: Some("Commons".to_owned()),
        members: default_members_per_space(),
    }]
}

const fn default_members_per_space() -> u32 {
    4
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_dt() -> f64 {
    0.1
}

const fn default_max_ticks() -> u64 {
    100
}

const fn default_energy_step() -> f64 {
    0.1
}

const fn default_attention_step() -> f64 {
    0.05
}

const fn default_constant_effect() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_owned()
}
