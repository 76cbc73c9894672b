//! Simulation parameters.

use serde::{Deserialize, Serialize};

/// Ticks in a full run.
pub const MAX_TICKS: usize = 5000;
/// Snapshot cadence, in ticks.
pub const SAVE_RATE: usize = 100;
/// Default RNG seed. Runs with the same field, seed, and numeric triple
/// replay byte-for-byte.
pub const DEFAULT_SEED: u64 = 1337;

/// Physical and run parameters. Densities and gravity are carried as plain
/// numbers here and converted into the pressure/velocity scalar types at
/// construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Density of air cells.
    pub rho_air: f64,
    /// Density of fluid cells.
    pub rho_fluid: i64,
    /// Gravity added to every open downward arrow each tick.
    pub g: f64,
    /// Ticks a full [`run`](crate::Simulation::run) advances.
    pub max_ticks: usize,
    /// Snapshot cadence in ticks, tick 0 included. Zero disables snapshots.
    pub save_rate: usize,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rho_air: 0.01,
            rho_fluid: 1000,
            g: 0.1,
            max_ticks: MAX_TICKS,
            save_rate: SAVE_RATE,
            seed: DEFAULT_SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_reference_setup() {
        let config = SimConfig::default();
        assert_eq!(config.rho_fluid, 1000);
        assert_eq!(config.max_ticks, 5000);
        assert_eq!(config.save_rate, 100);
        assert_eq!(config.seed, 1337);
    }

    #[test]
    fn serde_round_trip_with_partial_input() {
        let config: SimConfig = serde_json::from_str(r#"{"g": 0.5, "seed": 7}"#).unwrap();
        assert_eq!(config.g, 0.5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.rho_fluid, 1000);

        let text = serde_json::to_string(&config).unwrap();
        let back: SimConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
