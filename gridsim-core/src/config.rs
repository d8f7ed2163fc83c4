//! Simulation Configuration
//!
//! Timing knobs for the simulation driver. All three values are wall-clock
//! milliseconds clamped to [`MAX_MS`]; out-of-range input is clamped rather
//! than rejected.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for every configurable delay.
pub const MAX_MS: u64 = 10_000;

/// Runtime configuration for the simulation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Sleep between two ticks.
    /// Default: 10.
    pub tick_delay_ms: u64,

    /// Time between two phase flips of every clock component.
    /// Independent of the tick rate. Default: 500.
    pub clock_period_ms: u64,

    /// Quiet time after the last edit before a rebuild fires.
    /// Default: 200.
    pub rebuild_debounce_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: 10,
            clock_period_ms: 500,
            rebuild_debounce_ms: 200,
        }
    }
}

impl SimConfig {
    /// Clamp every field into `[0, MAX_MS]`.
    pub fn clamped(self) -> Self {
        Self {
            tick_delay_ms: self.tick_delay_ms.min(MAX_MS),
            clock_period_ms: self.clock_period_ms.min(MAX_MS),
            rebuild_debounce_ms: self.rebuild_debounce_ms.min(MAX_MS),
        }
    }

    /// Set the inter-tick delay, clamped.
    pub fn set_tick_delay_ms(&mut self, ms: u64) {
        self.tick_delay_ms = ms.min(MAX_MS);
    }

    /// Set the clock period, clamped.
    pub fn set_clock_period_ms(&mut self, ms: u64) {
        self.clock_period_ms = ms.min(MAX_MS);
    }

    /// Set the rebuild debounce window, clamped.
    pub fn set_rebuild_debounce_ms(&mut self, ms: u64) {
        self.rebuild_debounce_ms = ms.min(MAX_MS);
    }

    /// The inter-tick delay as a `Duration`.
    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    /// The clock period as a `Duration`.
    pub fn clock_period(&self) -> Duration {
        Duration::from_millis(self.clock_period_ms)
    }

    /// The rebuild debounce window as a `Duration`.
    pub fn rebuild_debounce(&self) -> Duration {
        Duration::from_millis(self.rebuild_debounce_ms)
    }

    /// Build options derived from this configuration.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            clock_period: self.clock_period(),
        }
    }

    /// Load from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.clamped())
    }
}

/// Options the graph builder needs from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Phase period handed to every clock component.
    pub clock_period: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        SimConfig::default().build_options()
    }
}
