//! Configuration System
//!
//! Hierarchical configuration loading from:
//! - `n2a.toml` (default configuration)
//! - `n2a.local.toml` (git-ignored local overrides)
//! - Environment variables (`N2A_` prefix, `__` nesting separator)
//!
//! ```toml
//! # n2a.toml
//! [numeric]
//! backend = "float"
//!
//! [simulation]
//! integrator = "rk4"
//! duration = 10.0
//! ```
//!
//! ```bash
//! N2A_NUMERIC__BACKEND=int
//! N2A_SIMULATION__INTEGRATOR=euler
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Top-level configuration, merged from file + environment layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub numeric: NumericConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which numeric representation the code generator emits: plain floating
/// point, or the int-backed fixed-point scheme with exponent inference
/// (stage 18 of [`crate::digest`] only runs in `Int` mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumericBackend {
    #[default]
    Float,
    Int,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericConfig {
    #[serde(default)]
    pub backend: NumericBackend,
    /// Whether the generated runtime keeps a thread-local `Simulator`
    /// singleton instead
    /// of passing one explicitly.
    #[serde(default)]
    pub tls_simulator: bool,
}

impl Default for NumericConfig {
    fn default() -> Self {
        NumericConfig {
            backend: NumericBackend::Float,
            tls_simulator: false,
        }
    }
}

/// Which integrator the generated runtime's `Euler`/`RK4` implementations
/// step with by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Integrator {
    #[default]
    Euler,
    Rk4,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub integrator: Integrator,
    /// Default simulation end time, seconds. Overridden by `$p` / `-end`.
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Default fixed integration step, seconds. Overridden by `$t'`.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Initial capacity reserved for the event queue's binary heap.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

fn default_duration() -> f64 {
    1.0
}
fn default_dt() -> f64 {
    1e-4
}
fn default_event_queue_capacity() -> usize {
    1024
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            integrator: Integrator::Euler,
            duration: default_duration(),
            dt: default_dt(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

/// Logging configuration, consumed by [`crate::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info`,
    /// `n2a_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `text` (human-readable) or `json` (structured, for log shipping).
    #[serde(default = "default_log_format")]
    pub format: String,
    /// When set, the generated binary's simulation-run log is also
    /// written daily-rolled to this directory (in addition to stderr),
    /// via a non-blocking `tracing-appender` writer.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the default locations, merging in order:
    /// `n2a.toml`, then `n2a.local.toml`, then `N2A_`-prefixed env vars.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("n2a.toml"))
            .merge(Toml::file("n2a.local.toml"))
            .merge(Env::prefixed("N2A_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path, with env overrides.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("N2A_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            numeric: NumericConfig::default(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_float_backend_and_euler() {
        let config = Config::default();
        assert_eq!(config.numeric.backend, NumericBackend::Float);
        assert_eq!(config.simulation.integrator, Integrator::Euler);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[numeric]"));
        assert!(toml_str.contains("[simulation]"));
    }
}
