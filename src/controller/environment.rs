//! # Environmental Controller
//!
//! Table-driven actuation: each tick the controller draws actuation values
//! inside the current phase's setpoint bands, occasionally replaces one of
//! them with an out-of-range value to emulate equipment trouble, and applies
//! any operator overrides received over the messaging link. There is no
//! feedback loop; the setpoint table is the whole policy.

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::domain::{
    Actuation, EnvParameter, Fault, GrowthPhase, PhaseError, SetpointRange, SetpointTable,
    Setpoints,
};

/// Maximum deviation applied to a parameter when a fault is injected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultSeverity {
    pub temperature_c: f64,
    pub ventilation_per_hour: f64,
    pub irrigation_ml: f64,
    pub light_hours: f64,
}

impl Default for FaultSeverity {
    fn default() -> Self {
        Self {
            temperature_c: 3.0,
            ventilation_per_hour: 0.5,
            irrigation_ml: 30.0,
            light_hours: 2.0,
        }
    }
}

/// Fault injection ("error simulation") configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    pub enabled: bool,
    /// Chance per tick that one parameter goes out of range.
    pub probability: f64,
    pub severity: FaultSeverity,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.1,
            severity: FaultSeverity::default(),
        }
    }
}

/// Remotely commanded actuation overrides. An override pins its parameter
/// until cleared, beating both nominal control and injected faults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideSet {
    pub temperature_c: Option<f64>,
    pub ventilation_per_hour: Option<f64>,
    pub irrigation_ml: Option<f64>,
    pub light_hours: Option<f64>,
}

impl OverrideSet {
    pub fn set(&mut self, parameter: EnvParameter, value: f64) {
        *self.slot(parameter) = Some(value);
    }

    pub fn clear(&mut self, parameter: EnvParameter) {
        *self.slot(parameter) = None;
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, parameter: EnvParameter) -> Option<f64> {
        match parameter {
            EnvParameter::Temperature => self.temperature_c,
            EnvParameter::Ventilation => self.ventilation_per_hour,
            EnvParameter::Irrigation => self.irrigation_ml,
            EnvParameter::LightHours => self.light_hours,
        }
    }

    pub fn is_empty(&self) -> bool {
        EnvParameter::iter().all(|p| self.get(p).is_none())
    }

    pub fn apply(&self, actuation: &mut Actuation) {
        for parameter in EnvParameter::iter() {
            if let Some(value) = self.get(parameter) {
                actuation.set(parameter, value);
            }
        }
    }

    fn slot(&mut self, parameter: EnvParameter) -> &mut Option<f64> {
        match parameter {
            EnvParameter::Temperature => &mut self.temperature_c,
            EnvParameter::Ventilation => &mut self.ventilation_per_hour,
            EnvParameter::Irrigation => &mut self.irrigation_ml,
            EnvParameter::LightHours => &mut self.light_hours,
        }
    }
}

/// What the controller decided for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlOutput {
    pub setpoints: Setpoints,
    pub actuation: Actuation,
    pub fault: Option<Fault>,
}

/// Phase-table driven environment controller with deterministic randomness.
pub struct EnvironmentController {
    table: SetpointTable,
    faults: FaultConfig,
    rng: StdRng,
}

impl EnvironmentController {
    pub fn new(table: SetpointTable, faults: FaultConfig, seed: u64) -> Self {
        Self {
            table,
            faults,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn table(&self) -> &SetpointTable {
        &self.table
    }

    /// Compute setpoints and actuation for the given phase.
    ///
    /// Terminal phases have nothing to actuate and return an error.
    pub fn actuate(
        &mut self,
        phase: GrowthPhase,
        overrides: &OverrideSet,
    ) -> Result<ControlOutput, PhaseError> {
        let setpoints = self
            .table
            .for_phase(phase)
            .ok_or(PhaseError::Terminal(phase))?
            .clone();

        let mut actuation = Actuation {
            temperature_c: self.draw(&setpoints.temperature_c),
            ventilation_per_hour: self.draw(&setpoints.ventilation_per_hour),
            irrigation_ml: self.draw(&setpoints.irrigation_ml),
            light_hours: self.draw(&setpoints.light_hours),
        };

        let fault = if self.faults.enabled && self.rng.gen::<f64>() < self.faults.probability {
            Some(self.inject_fault(&setpoints, &mut actuation))
        } else {
            None
        };

        // Operator overrides win over nominal control and injected faults.
        overrides.apply(&mut actuation);

        Ok(ControlOutput {
            setpoints,
            actuation,
            fault,
        })
    }

    fn draw(&mut self, range: &SetpointRange) -> f64 {
        round1(self.rng.gen_range(range.min..=range.max))
    }

    fn inject_fault(&mut self, setpoints: &Setpoints, actuation: &mut Actuation) -> Fault {
        let parameter = EnvParameter::iter()
            .choose(&mut self.rng)
            .unwrap_or(EnvParameter::Temperature);
        let range = setpoints.range(parameter);
        let too_low = self.rng.gen_bool(0.5);
        let severity = self.faults.severity;

        let (value, description) = match parameter {
            EnvParameter::Temperature => {
                let dev = self.rng.gen_range(1.0..=severity.temperature_c.max(1.0));
                if too_low {
                    let v = round1(range.min - dev);
                    (v, format!("Temperature too low: {v:.1}°C"))
                } else {
                    let v = round1(range.max + dev);
                    (v, format!("Temperature too high: {v:.1}°C"))
                }
            }
            EnvParameter::Ventilation => {
                let dev = self
                    .rng
                    .gen_range(0.1..=severity.ventilation_per_hour.max(0.1));
                if too_low {
                    let v = round1((range.min - dev).max(0.1));
                    (v, format!("Ventilation too low: {v:.1}/hr"))
                } else {
                    let v = round1(range.max + dev);
                    (v, format!("Ventilation too high: {v:.1}/hr"))
                }
            }
            EnvParameter::Irrigation => {
                let dev = self.rng.gen_range(10.0..=severity.irrigation_ml.max(10.0));
                if too_low {
                    let v = round1((range.min - dev).max(10.0));
                    (v, format!("Irrigation too low: {v:.1}ml"))
                } else {
                    let v = round1(range.max + dev);
                    (v, format!("Irrigation too high: {v:.1}ml"))
                }
            }
            EnvParameter::LightHours => {
                let dev = self.rng.gen_range(1.0..=severity.light_hours.max(1.0));
                if too_low {
                    let v = round1((range.min - dev).max(6.0));
                    (v, format!("Light hours too low: {v:.1}hrs"))
                } else {
                    let v = round1((range.max + dev).min(24.0));
                    (v, format!("Light hours too high: {v:.1}hrs"))
                }
            }
        };

        actuation.set(parameter, value);
        Fault {
            parameter,
            value,
            description,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
