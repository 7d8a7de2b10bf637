use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Command line flags. These override the file/env configuration layers.
#[derive(Parser, Debug)]
#[command(
    name = "flax-greenhouse-controller",
    version,
    about = "Indoor flax greenhouse simulation with phase-driven environment control"
)]
pub struct Args {
    /// Run against simulated hardware. This build ships no hardware
    /// drivers, so the flag is accepted for compatibility and always in
    /// effect.
    #[arg(long)]
    pub simulate: bool,

    /// Pace the run in real time instead of finishing as fast as possible
    #[arg(long)]
    pub interactive: bool,

    /// MQTT broker address; remote control stays disabled without it
    #[arg(long)]
    pub mqtt_broker: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    pub mqtt_port: Option<u16>,

    /// Number of plants in the bed
    #[arg(long)]
    pub plants: Option<u32>,

    /// Stop after this many simulated days
    #[arg(long)]
    pub days: Option<u32>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable random fault injection
    #[arg(long)]
    pub no_faults: bool,

    /// Directory for the CSV log and the run summary
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Args {
    pub fn apply(&self, cfg: &mut Config) {
        if self.interactive {
            cfg.simulation.interactive = true;
        }
        if let Some(broker) = &self.mqtt_broker {
            cfg.mqtt.broker = Some(broker.clone());
        }
        if let Some(port) = self.mqtt_port {
            cfg.mqtt.port = port;
        }
        if let Some(plants) = self.plants {
            cfg.simulation.plants = plants;
        }
        if let Some(days) = self.days {
            cfg.simulation.max_days = Some(days);
        }
        if let Some(seed) = self.seed {
            cfg.simulation.seed = Some(seed);
        }
        if self.no_faults {
            cfg.faults.enabled = false;
        }
        if let Some(dir) = &self.data_dir {
            cfg.storage.data_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "flax-greenhouse-controller",
            "--simulate",
            "--interactive",
            "--mqtt-broker",
            "broker.local",
            "--plants",
            "4",
            "--seed",
            "1234",
            "--no-faults",
        ])
        .unwrap();

        let mut cfg = Config::default();
        args.apply(&mut cfg);

        assert!(cfg.simulation.interactive);
        assert_eq!(cfg.mqtt.broker.as_deref(), Some("broker.local"));
        assert_eq!(cfg.simulation.plants, 4);
        assert_eq!(cfg.simulation.seed, Some(1234));
        assert!(!cfg.faults.enabled);
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::try_parse_from(["flax-greenhouse-controller"]).unwrap();
        let mut cfg = Config::default();
        args.apply(&mut cfg);

        assert!(!cfg.simulation.interactive);
        assert!(cfg.mqtt.broker.is_none());
        assert_eq!(cfg.simulation.plants, 1);
        assert!(cfg.faults.enabled);
    }
}
