//! Simulated sensor array.
//!
//! Turns the actuation the controller applied into the readings the growth
//! model sees, with Gaussian measurement noise. Humidity and soil moisture
//! have no actuator of their own; they are derived from ventilation and
//! irrigation respectively.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::{Actuation, EnvironmentReading};

/// Ventilation rate around which humidity sits at its base value.
const VENT_REFERENCE_PER_HOUR: f64 = 2.5;
/// Humidity change per air exchange above/below the reference.
const HUMIDITY_PER_VENT: f64 = 4.0;
/// Irrigation volume around which soil moisture sits at its base value.
const IRRIGATION_REFERENCE_ML: f64 = 150.0;
/// Soil moisture change per ml above/below the reference.
const MOISTURE_PER_ML: f64 = 0.05;

/// Something that can measure the greenhouse. Hardware would implement this
/// over I2C/1-wire; the simulation derives readings from the actuation.
#[async_trait]
pub trait SensorArray: Send {
    async fn sample(&mut self, actuation: &Actuation) -> Result<EnvironmentReading>;
}

/// Measurement noise configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorNoiseConfig {
    pub temperature_std_c: f64,
    pub light_std_hours: f64,
    pub humidity_base_percent: f64,
    pub humidity_std_percent: f64,
    pub soil_moisture_base_percent: f64,
    pub soil_moisture_std_percent: f64,
}

impl Default for SensorNoiseConfig {
    fn default() -> Self {
        Self {
            temperature_std_c: 0.3,
            light_std_hours: 0.1,
            humidity_base_percent: 60.0,
            humidity_std_percent: 4.0,
            soil_moisture_base_percent: 70.0,
            soil_moisture_std_percent: 5.0,
        }
    }
}

pub struct SimulatedSensorArray {
    cfg: SensorNoiseConfig,
    temperature_noise: Normal<f64>,
    light_noise: Normal<f64>,
    humidity_noise: Normal<f64>,
    soil_noise: Normal<f64>,
    rng: StdRng,
}

impl SimulatedSensorArray {
    pub fn new(cfg: SensorNoiseConfig, seed: u64) -> Result<Self> {
        let normal = |std: f64| {
            Normal::new(0.0, std).map_err(|e| anyhow!("invalid sensor noise std {std}: {e}"))
        };
        Ok(Self {
            temperature_noise: normal(cfg.temperature_std_c)?,
            light_noise: normal(cfg.light_std_hours)?,
            humidity_noise: normal(cfg.humidity_std_percent)?,
            soil_noise: normal(cfg.soil_moisture_std_percent)?,
            cfg,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

#[async_trait]
impl SensorArray for SimulatedSensorArray {
    async fn sample(&mut self, actuation: &Actuation) -> Result<EnvironmentReading> {
        let temperature_c =
            round1(actuation.temperature_c + self.temperature_noise.sample(&mut self.rng));
        let light_hours = round1(
            (actuation.light_hours + self.light_noise.sample(&mut self.rng)).clamp(0.0, 24.0),
        );
        let humidity_percent = round1(
            (self.cfg.humidity_base_percent
                - (actuation.ventilation_per_hour - VENT_REFERENCE_PER_HOUR) * HUMIDITY_PER_VENT
                + self.humidity_noise.sample(&mut self.rng))
            .clamp(20.0, 95.0),
        );
        let soil_moisture_percent = round1(
            (self.cfg.soil_moisture_base_percent
                + (actuation.irrigation_ml - IRRIGATION_REFERENCE_ML) * MOISTURE_PER_ML
                + self.soil_noise.sample(&mut self.rng))
            .clamp(5.0, 95.0),
        );

        Ok(EnvironmentReading {
            temperature_c,
            humidity_percent,
            soil_moisture_percent,
            light_hours,
            irrigation_ml: actuation.irrigation_ml,
            ventilation_per_hour: actuation.ventilation_per_hour,
        })
    }
}

/// Noise-free sensor array that reports the actuation verbatim. Used in
/// tests where the trajectory must be easy to reason about.
pub struct FixedSensorArray {
    pub humidity_percent: f64,
    pub soil_moisture_percent: f64,
}

impl Default for FixedSensorArray {
    fn default() -> Self {
        Self {
            humidity_percent: 60.0,
            soil_moisture_percent: 70.0,
        }
    }
}

#[async_trait]
impl SensorArray for FixedSensorArray {
    async fn sample(&mut self, actuation: &Actuation) -> Result<EnvironmentReading> {
        Ok(EnvironmentReading {
            temperature_c: actuation.temperature_c,
            humidity_percent: self.humidity_percent,
            soil_moisture_percent: self.soil_moisture_percent,
            light_hours: actuation.light_hours,
            irrigation_ml: actuation.irrigation_ml,
            ventilation_per_hour: actuation.ventilation_per_hour,
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actuation() -> Actuation {
        Actuation {
            temperature_c: 20.0,
            ventilation_per_hour: 2.5,
            irrigation_ml: 150.0,
            light_hours: 15.0,
        }
    }

    #[tokio::test]
    async fn test_readings_track_actuation() {
        let mut sensors = SimulatedSensorArray::new(SensorNoiseConfig::default(), 42).unwrap();
        let reading = sensors.sample(&actuation()).await.unwrap();

        assert!((reading.temperature_c - 20.0).abs() < 2.0);
        assert!((reading.light_hours - 15.0).abs() < 1.0);
        assert!((20.0..=95.0).contains(&reading.humidity_percent));
        assert!((5.0..=95.0).contains(&reading.soil_moisture_percent));
        assert_eq!(reading.irrigation_ml, 150.0);
        assert_eq!(reading.ventilation_per_hour, 2.5);
    }

    #[tokio::test]
    async fn test_same_seed_same_noise() {
        let mut a = SimulatedSensorArray::new(SensorNoiseConfig::default(), 7).unwrap();
        let mut b = SimulatedSensorArray::new(SensorNoiseConfig::default(), 7).unwrap();
        for _ in 0..10 {
            let ra = a.sample(&actuation()).await.unwrap();
            let rb = b.sample(&actuation()).await.unwrap();
            assert_eq!(ra, rb);
        }
    }

    #[tokio::test]
    async fn test_heavy_irrigation_raises_soil_moisture() {
        let cfg = SensorNoiseConfig {
            soil_moisture_std_percent: 1.0,
            ..Default::default()
        };
        let mut sensors = SimulatedSensorArray::new(cfg, 42).unwrap();
        let mut wet = actuation();
        wet.irrigation_ml = 400.0;
        let mut dry = actuation();
        dry.irrigation_ml = 10.0;

        let wet_reading = sensors.sample(&wet).await.unwrap();
        let dry_reading = sensors.sample(&dry).await.unwrap();
        assert!(wet_reading.soil_moisture_percent > dry_reading.soil_moisture_percent);
    }

    #[tokio::test]
    async fn test_fixed_array_passes_values_through() {
        let mut sensors = FixedSensorArray::default();
        let reading = sensors.sample(&actuation()).await.unwrap();
        assert_eq!(reading.temperature_c, 20.0);
        assert_eq!(reading.humidity_percent, 60.0);
    }
}
