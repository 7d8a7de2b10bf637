use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::GrowthPhase;

/// One environmental variable under closed-loop control.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnvParameter {
    Temperature,
    Ventilation,
    Irrigation,
    LightHours,
}

/// Acceptable band and optimum for a single controlled variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetpointRange {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

impl SetpointRange {
    pub fn new(min: f64, max: f64, optimal: f64) -> Self {
        Self { min, max, optimal }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Target actuation bands for one growth phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setpoints {
    pub temperature_c: SetpointRange,
    pub ventilation_per_hour: SetpointRange,
    pub irrigation_ml: SetpointRange,
    pub light_hours: SetpointRange,
}

impl Setpoints {
    pub fn range(&self, parameter: EnvParameter) -> &SetpointRange {
        match parameter {
            EnvParameter::Temperature => &self.temperature_c,
            EnvParameter::Ventilation => &self.ventilation_per_hour,
            EnvParameter::Irrigation => &self.irrigation_ml,
            EnvParameter::LightHours => &self.light_hours,
        }
    }
}

/// Static setpoint table keyed by phase. Read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetpointTable {
    pub germination: Setpoints,
    pub growth: Setpoints,
    pub flowering: Setpoints,
    pub ripening: Setpoints,
}

impl Default for SetpointTable {
    fn default() -> Self {
        Self {
            germination: Setpoints {
                temperature_c: SetpointRange::new(15.0, 20.0, 18.0),
                ventilation_per_hour: SetpointRange::new(1.0, 2.0, 1.5),
                irrigation_ml: SetpointRange::new(50.0, 100.0, 75.0),
                light_hours: SetpointRange::new(12.0, 14.0, 13.0),
            },
            growth: Setpoints {
                temperature_c: SetpointRange::new(18.0, 22.0, 20.0),
                ventilation_per_hour: SetpointRange::new(2.0, 3.0, 2.5),
                irrigation_ml: SetpointRange::new(100.0, 200.0, 150.0),
                light_hours: SetpointRange::new(14.0, 16.0, 15.0),
            },
            flowering: Setpoints {
                temperature_c: SetpointRange::new(20.0, 24.0, 22.0),
                ventilation_per_hour: SetpointRange::new(3.0, 4.0, 3.5),
                irrigation_ml: SetpointRange::new(150.0, 250.0, 200.0),
                light_hours: SetpointRange::new(14.0, 14.0, 14.0),
            },
            ripening: Setpoints {
                temperature_c: SetpointRange::new(18.0, 22.0, 20.0),
                ventilation_per_hour: SetpointRange::new(2.0, 3.0, 2.5),
                irrigation_ml: SetpointRange::new(100.0, 200.0, 150.0),
                light_hours: SetpointRange::new(12.0, 14.0, 13.0),
            },
        }
    }
}

impl SetpointTable {
    /// Setpoints for an active phase; terminal phases have none.
    pub fn for_phase(&self, phase: GrowthPhase) -> Option<&Setpoints> {
        match phase {
            GrowthPhase::Germination => Some(&self.germination),
            GrowthPhase::Growth => Some(&self.growth),
            GrowthPhase::Flowering => Some(&self.flowering),
            GrowthPhase::Ripening => Some(&self.ripening),
            GrowthPhase::Done | GrowthPhase::Dead => None,
        }
    }
}

/// Values the controller actually applied to the actuators for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actuation {
    pub temperature_c: f64,
    pub ventilation_per_hour: f64,
    pub irrigation_ml: f64,
    pub light_hours: f64,
}

impl Actuation {
    pub fn value(&self, parameter: EnvParameter) -> f64 {
        match parameter {
            EnvParameter::Temperature => self.temperature_c,
            EnvParameter::Ventilation => self.ventilation_per_hour,
            EnvParameter::Irrigation => self.irrigation_ml,
            EnvParameter::LightHours => self.light_hours,
        }
    }

    pub fn set(&mut self, parameter: EnvParameter, value: f64) {
        match parameter {
            EnvParameter::Temperature => self.temperature_c = value,
            EnvParameter::Ventilation => self.ventilation_per_hour = value,
            EnvParameter::Irrigation => self.irrigation_ml = value,
            EnvParameter::LightHours => self.light_hours = value,
        }
    }
}

/// Measured greenhouse conditions for one tick, as seen by the growth model.
///
/// Temperature, humidity, soil moisture and light come from the (simulated)
/// sensors; irrigation and ventilation are carried over from the actuation
/// that produced the reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub soil_moisture_percent: f64,
    pub light_hours: f64,
    pub irrigation_ml: f64,
    pub ventilation_per_hour: f64,
}

/// An injected out-of-range condition reported for a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    pub parameter: EnvParameter,
    pub value: f64,
    pub description: String,
}
