use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::path::PathBuf;

use crate::controller::environment::FaultConfig;
use crate::domain::{PhaseSchedule, SetpointTable};
use crate::simulation::{GrowthConfig, SensorNoiseConfig};

/// Full runtime configuration.
///
/// Every section has defaults mirroring the 80-day indoor flax cycle, so an
/// empty file (or none at all) yields a working simulation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub schedule: PhaseSchedule,
    pub setpoints: SetpointTable,
    pub growth: GrowthConfig,
    pub faults: FaultConfig,
    pub sensors: SensorNoiseConfig,
    pub mqtt: MqttConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of plants in the bed.
    pub plants: u32,
    /// RNG seed; omit for a fresh trajectory every run.
    pub seed: Option<u64>,
    /// Real seconds per simulated day in interactive mode.
    pub tick_seconds: u64,
    pub interactive: bool,
    /// Stop after this many days regardless of plant state.
    pub max_days: Option<u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            plants: 1,
            seed: None,
            tick_seconds: 1,
            interactive: false,
            max_days: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker address; remote control stays disabled when unset.
    pub broker: Option<String>,
    pub port: u16,
    pub client_id: String,
    pub topic_prefix: String,
    pub keep_alive_seconds: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: None,
            port: 1883,
            client_id: "greenhouse-controller".into(),
            topic_prefix: "greenhouse".into(),
            keep_alive_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("GREENHOUSE__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_complete() {
        let cfg = Config::default();
        assert_eq!(cfg.simulation.plants, 1);
        assert_eq!(cfg.schedule.total_days(), 80);
        assert!(cfg.faults.enabled);
        assert!(cfg.mqtt.broker.is_none());
        assert!(cfg.schedule.validate().is_ok());
    }
}
