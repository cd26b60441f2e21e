//! Tunable constants for peer interaction.
//!
//! The defaults are the reference convergence steps: energy moves 10% of the
//! way toward the peer mean per interaction, attention 5%.

use serde::Deserialize;

/// Step sizes applied by [`interact`](crate::interact::interact).
///
/// Each step is a fraction in 0.0 to 1.0 of the gap between a member's value
/// and the mean of its peers.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PropagationConfig {
    /// Fraction of the energy gap closed per interaction (default: 0.1).
    #[serde(default = "default_energy_step")]
    pub energy_step: f64,

    /// Fraction of the attention gap closed per interaction (default: 0.05).
    #[serde(default = "default_attention_step")]
    pub attention_step: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            energy_step: default_energy_step(),
            attention_step: default_attention_step(),
        }
    }
}

const fn default_energy_step() -> f64 {
    0.1
}

const fn default_attention_step() -> f64 {
    0.05
}
