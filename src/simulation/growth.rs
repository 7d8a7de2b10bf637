//! # Plant Growth Model
//!
//! Advances plant state once per simulated day. Growth per day is the
//! phase-specific base rate shaped by an S-curve over phase progress and a
//! response factor computed from how far the measured environment sits from
//! the phase's ideal ranges. Sustained stress drains health; when health
//! reaches zero the plant is forced into the `Dead` phase and all growth
//! stops for good.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    EnvironmentReading, GrowthPhase, PhaseError, PhaseSchedule, PlantState, SetpointRange,
    SetpointTable, Setpoints,
};

/// Growth-model errors
#[derive(Debug, Error)]
pub enum GrowthError {
    #[error("tick for day {day} does not directly follow day {age}")]
    NonSequentialDay { age: u32, day: u32 },
    #[error(transparent)]
    Phase(#[from] PhaseError),
}

/// Average daily growth increments for one phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseRates {
    pub height_cm: f64,
    pub root_cm: f64,
    pub flowers: f64,
}

impl Default for PhaseRates {
    fn default() -> Self {
        Self {
            height_cm: 0.0,
            root_cm: 0.0,
            flowers: 0.0,
        }
    }
}

/// Appearance rating bands (0-10) by phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceBands {
    pub germination: (f64, f64),
    pub growth: (f64, f64),
    pub flowering: (f64, f64),
    pub ripening: (f64, f64),
}

impl Default for AppearanceBands {
    fn default() -> Self {
        Self {
            germination: (2.0, 4.0),
            growth: (5.0, 8.0),
            flowering: (7.0, 10.0),
            ripening: (6.0, 9.0),
        }
    }
}

impl AppearanceBands {
    fn band(&self, phase: GrowthPhase) -> Option<(f64, f64)> {
        match phase {
            GrowthPhase::Germination => Some(self.germination),
            GrowthPhase::Growth => Some(self.growth),
            GrowthPhase::Flowering => Some(self.flowering),
            GrowthPhase::Ripening => Some(self.ripening),
            GrowthPhase::Done | GrowthPhase::Dead => None,
        }
    }
}

/// Health drain/recovery model.
///
/// Stress below the tolerance is shrugged off and health slowly recovers;
/// anything above it drains health proportionally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub stress_tolerance: f64,
    pub drain_per_stress: f64,
    pub recovery_per_day: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stress_tolerance: 0.1,
            drain_per_stress: 25.0,
            recovery_per_day: 2.0,
        }
    }
}

/// Growth model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub max_height_cm: f64,
    pub max_root_depth_cm: f64,
    pub max_flowers: u32,
    /// Height at which germination ends early.
    pub emergence_height_cm: f64,
    /// Daily growth variation amplitude (0.1 = plus/minus 10%).
    pub daily_variation: f64,
    pub germination: PhaseRates,
    pub growth: PhaseRates,
    pub flowering: PhaseRates,
    pub ripening: PhaseRates,
    pub appearance: AppearanceBands,
    pub health: HealthConfig,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            max_height_cm: 120.0,
            max_root_depth_cm: 120.0,
            max_flowers: 50,
            emergence_height_cm: 2.0,
            daily_variation: 0.1,
            germination: PhaseRates {
                height_cm: 0.4,
                root_cm: 1.2,
                flowers: 0.0,
            },
            growth: PhaseRates {
                height_cm: 1.0,
                root_cm: 1.0,
                flowers: 0.0,
            },
            flowering: PhaseRates {
                height_cm: 1.2,
                root_cm: 0.6,
                flowers: 2.5,
            },
            ripening: PhaseRates {
                height_cm: 0.2,
                root_cm: 0.2,
                flowers: 0.2,
            },
            appearance: AppearanceBands::default(),
            health: HealthConfig::default(),
        }
    }
}

impl GrowthConfig {
    fn rates(&self, phase: GrowthPhase) -> Option<&PhaseRates> {
        match phase {
            GrowthPhase::Germination => Some(&self.germination),
            GrowthPhase::Growth => Some(&self.growth),
            GrowthPhase::Flowering => Some(&self.flowering),
            GrowthPhase::Ripening => Some(&self.ripening),
            GrowthPhase::Done | GrowthPhase::Dead => None,
        }
    }
}

struct ResponseWeights {
    low_growth: f64,
    low_stress: f64,
    high_growth: f64,
    high_stress: f64,
    bonus: f64,
}

// Being too hot hurts more than too cold, drought more than overwatering.
const TEMPERATURE_WEIGHTS: ResponseWeights = ResponseWeights {
    low_growth: 0.5,
    low_stress: 0.3,
    high_growth: 0.6,
    high_stress: 0.4,
    bonus: 0.2,
};
const IRRIGATION_WEIGHTS: ResponseWeights = ResponseWeights {
    low_growth: 0.7,
    low_stress: 0.5,
    high_growth: 0.6,
    high_stress: 0.4,
    bonus: 0.1,
};
const VENTILATION_WEIGHTS: ResponseWeights = ResponseWeights {
    low_growth: 0.4,
    low_stress: 0.2,
    high_growth: 0.3,
    high_stress: 0.1,
    bonus: 0.1,
};
const LIGHT_WEIGHTS: ResponseWeights = ResponseWeights {
    low_growth: 0.6,
    low_stress: 0.3,
    high_growth: 0.3,
    high_stress: 0.2,
    bonus: 0.2,
};

fn rate_parameter(
    value: f64,
    range: &SetpointRange,
    weights: &ResponseWeights,
    factor: &mut f64,
    stress: &mut f64,
) {
    if value < range.min {
        let penalty = (range.min - value) / range.min;
        *factor -= penalty * weights.low_growth;
        *stress += penalty * weights.low_stress;
    } else if value > range.max {
        let penalty = (value - range.max) / range.max;
        *factor -= penalty * weights.high_growth;
        *stress += penalty * weights.high_stress;
    } else {
        let optimality = if range.width() == 0.0 {
            if (value - range.optimal).abs() < f64::EPSILON {
                1.0
            } else {
                0.8
            }
        } else {
            1.0 - (value - range.optimal).abs() / range.width()
        };
        *factor += optimality * weights.bonus;
    }
}

/// Overall growth factor in `[0.1, 1.2]` and stress in `[0, 1]` for a
/// reading against a phase's ideal ranges.
pub fn growth_response(reading: &EnvironmentReading, setpoints: &Setpoints) -> (f64, f64) {
    let mut factor = 1.0;
    let mut stress = 0.0;
    rate_parameter(
        reading.temperature_c,
        &setpoints.temperature_c,
        &TEMPERATURE_WEIGHTS,
        &mut factor,
        &mut stress,
    );
    rate_parameter(
        reading.irrigation_ml,
        &setpoints.irrigation_ml,
        &IRRIGATION_WEIGHTS,
        &mut factor,
        &mut stress,
    );
    rate_parameter(
        reading.ventilation_per_hour,
        &setpoints.ventilation_per_hour,
        &VENTILATION_WEIGHTS,
        &mut factor,
        &mut stress,
    );
    rate_parameter(
        reading.light_hours,
        &setpoints.light_hours,
        &LIGHT_WEIGHTS,
        &mut factor,
        &mut stress,
    );
    (factor.clamp(0.1, 1.2), stress.clamp(0.0, 1.0))
}

/// Growth model for a single plant.
pub struct PlantModel {
    cfg: GrowthConfig,
    state: PlantState,
    flowers_f: f64,
    rng: StdRng,
}

impl PlantModel {
    pub fn new(plant_id: u32, cfg: GrowthConfig, seed: u64) -> Self {
        Self {
            cfg,
            state: PlantState::new(plant_id),
            flowers_f: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> &PlantState {
        &self.state
    }

    /// Advance the plant by one day.
    ///
    /// `day` must directly follow the plant's current age; terminal plants
    /// only age, nothing else changes.
    pub fn advance(
        &mut self,
        day: u32,
        schedule: &PhaseSchedule,
        table: &SetpointTable,
        reading: &EnvironmentReading,
    ) -> Result<&PlantState, GrowthError> {
        if day != self.state.age_days + 1 {
            return Err(GrowthError::NonSequentialDay {
                age: self.state.age_days,
                day,
            });
        }
        self.state.age_days = day;

        if self.state.is_terminal() {
            return Ok(&self.state);
        }

        // Follow the schedule one phase at a time; never skip, never regress.
        let target = schedule.phase_for_day(day)?;
        while self.state.phase < target {
            match self.state.phase.next() {
                Some(next) => self.state.phase = next,
                None => break,
            }
        }
        if self.state.phase.is_terminal() {
            return Ok(&self.state);
        }

        let setpoints = table
            .for_phase(self.state.phase)
            .ok_or(PhaseError::Terminal(self.state.phase))?;
        let (factor, stress) = growth_response(reading, setpoints);
        self.state.stress = stress;

        self.grow(day, schedule, factor);

        // Germination ends early once the seedling breaks the surface.
        if self.state.phase == GrowthPhase::Germination
            && self.state.height_cm >= self.cfg.emergence_height_cm
        {
            self.state.phase = GrowthPhase::Growth;
        }

        self.update_health();
        self.update_appearance();

        if self.state.health <= 0.0 {
            self.state.health = 0.0;
            self.state.phase = GrowthPhase::Dead;
            self.state.appearance = 0.0;
        }

        Ok(&self.state)
    }

    fn grow(&mut self, day: u32, schedule: &PhaseSchedule, factor: f64) {
        let phase = self.state.phase;
        let Some(rates) = self.cfg.rates(phase) else {
            return;
        };
        // S-curve within the phase. The doubled sigmoid averages to ~1 over a
        // full phase, so totals stay close to rate * phase length.
        let progress = schedule.progress(phase, day);
        let sigmoid = 2.0 / (1.0 + (-10.0 * (progress - 0.5)).exp());
        let variation =
            1.0 + self.rng.gen_range(-self.cfg.daily_variation..=self.cfg.daily_variation);
        let scale = sigmoid * factor * variation;

        self.state.height_cm =
            (self.state.height_cm + rates.height_cm * scale).min(self.cfg.max_height_cm);
        self.state.root_depth_cm =
            (self.state.root_depth_cm + rates.root_cm * scale).min(self.cfg.max_root_depth_cm);
        self.flowers_f = (self.flowers_f + rates.flowers * scale).min(self.cfg.max_flowers as f64);
        self.state.flowers = self.flowers_f.round() as u32;
    }

    fn update_health(&mut self) {
        let health = &self.cfg.health;
        if self.state.stress > health.stress_tolerance {
            self.state.health -=
                (self.state.stress - health.stress_tolerance) * health.drain_per_stress;
        } else {
            self.state.health += health.recovery_per_day;
        }
        self.state.health = self.state.health.clamp(0.0, 100.0);
    }

    fn update_appearance(&mut self) {
        let Some((lo, hi)) = self.cfg.appearance.band(self.state.phase) else {
            return;
        };
        let base = lo + (hi - lo) * (1.0 - self.state.stress);
        let jitter = self.rng.gen_range(-0.3..=0.3);
        self.state.appearance = (base + jitter).clamp(0.0, 10.0);
    }
}

/// Growth model for the whole bed of plants.
///
/// Each plant gets its own derived RNG seed so beds of any size stay
/// reproducible.
pub struct GrowthSimulator {
    schedule: PhaseSchedule,
    table: SetpointTable,
    plants: Vec<PlantModel>,
    day: u32,
}

impl GrowthSimulator {
    pub fn new(
        cfg: &GrowthConfig,
        schedule: PhaseSchedule,
        table: SetpointTable,
        num_plants: u32,
        seed: u64,
    ) -> Self {
        let plants = (0..num_plants.max(1))
            .map(|i| PlantModel::new(i + 1, cfg.clone(), seed.wrapping_add(u64::from(i))))
            .collect();
        Self {
            schedule,
            table,
            plants,
            day: 0,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Advance every plant by one day and return the resulting states.
    pub fn advance_day(
        &mut self,
        day: u32,
        reading: &EnvironmentReading,
    ) -> Result<Vec<PlantState>, GrowthError> {
        for plant in &mut self.plants {
            plant.advance(day, &self.schedule, &self.table, reading)?;
        }
        self.day = day;
        Ok(self.states())
    }

    /// Phase of the first plant still progressing, used to drive actuation.
    pub fn lead_phase(&self) -> GrowthPhase {
        self.plants
            .iter()
            .map(PlantModel::state)
            .find(|s| !s.is_terminal())
            .map(|s| s.phase)
            .unwrap_or(GrowthPhase::Done)
    }

    pub fn all_terminal(&self) -> bool {
        self.plants.iter().all(|p| p.state().is_terminal())
    }

    pub fn states(&self) -> Vec<PlantState> {
        self.plants.iter().map(|p| p.state().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn optimal_reading(setpoints: &Setpoints) -> EnvironmentReading {
        EnvironmentReading {
            temperature_c: setpoints.temperature_c.optimal,
            humidity_percent: 60.0,
            soil_moisture_percent: 70.0,
            light_hours: setpoints.light_hours.optimal,
            irrigation_ml: setpoints.irrigation_ml.optimal,
            ventilation_per_hour: setpoints.ventilation_per_hour.optimal,
        }
    }

    fn hostile_reading() -> EnvironmentReading {
        EnvironmentReading {
            temperature_c: 45.0,
            humidity_percent: 20.0,
            soil_moisture_percent: 5.0,
            light_hours: 4.0,
            irrigation_ml: 0.0,
            ventilation_per_hour: 0.0,
        }
    }

    #[test]
    fn test_optimal_conditions_boost_growth() {
        let table = SetpointTable::default();
        let setpoints = table.for_phase(GrowthPhase::Growth).unwrap();
        let (factor, stress) = growth_response(&optimal_reading(setpoints), setpoints);
        assert!(factor > 1.0);
        assert_eq!(stress, 0.0);
    }

    #[test]
    fn test_hostile_conditions_floor_growth() {
        let table = SetpointTable::default();
        let setpoints = table.for_phase(GrowthPhase::Growth).unwrap();
        let (factor, stress) = growth_response(&hostile_reading(), setpoints);
        assert_eq!(factor, 0.1);
        assert!(stress > 0.5);
    }

    #[test]
    fn test_non_sequential_day_is_rejected() {
        let table = SetpointTable::default();
        let schedule = PhaseSchedule::default();
        let mut plant = PlantModel::new(1, GrowthConfig::default(), 7);
        let reading = optimal_reading(table.for_phase(GrowthPhase::Germination).unwrap());

        plant.advance(1, &schedule, &table, &reading).unwrap();
        assert!(plant.advance(3, &schedule, &table, &reading).is_err());
        assert!(plant.advance(2, &schedule, &table, &reading).is_ok());
    }

    #[test]
    fn test_emergence_ends_germination_early() {
        let cfg = GrowthConfig {
            emergence_height_cm: 0.001,
            ..Default::default()
        };
        let table = SetpointTable::default();
        let schedule = PhaseSchedule::default();
        let mut plant = PlantModel::new(1, cfg, 7);
        let reading = optimal_reading(table.for_phase(GrowthPhase::Germination).unwrap());

        let state = plant.advance(1, &schedule, &table, &reading).unwrap();
        assert_eq!(state.phase, GrowthPhase::Growth);
    }

    #[test]
    fn test_sustained_stress_kills_and_freezes_growth() {
        let table = SetpointTable::default();
        let schedule = PhaseSchedule::default();
        let mut plant = PlantModel::new(1, GrowthConfig::default(), 7);
        let reading = hostile_reading();

        let mut day = 0;
        while plant.state().phase != GrowthPhase::Dead {
            day += 1;
            assert!(day <= 40, "plant should not survive sustained hostile conditions");
            plant.advance(day, &schedule, &table, &reading).unwrap();
        }

        let at_death = plant.state().clone();
        assert_eq!(at_death.health, 0.0);

        for _ in 0..5 {
            day += 1;
            plant.advance(day, &schedule, &table, &reading).unwrap();
        }
        let after = plant.state();
        assert_eq!(after.phase, GrowthPhase::Dead);
        assert_eq!(after.height_cm, at_death.height_cm);
        assert_eq!(after.root_depth_cm, at_death.root_depth_cm);
        assert_eq!(after.flowers, at_death.flowers);
        assert_eq!(after.age_days, day);
    }

    #[test]
    fn test_full_cycle_reaches_done_without_skipping() {
        let table = SetpointTable::default();
        let schedule = PhaseSchedule::default();
        let mut plant = PlantModel::new(1, GrowthConfig::default(), 42);

        let mut previous = plant.state().phase;
        for day in 1..=schedule.total_days() + 1 {
            let setpoints = table
                .for_phase(plant.state().phase)
                .cloned()
                .unwrap_or_else(|| table.ripening.clone());
            let state = plant
                .advance(day, &schedule, &table, &optimal_reading(&setpoints))
                .unwrap();
            // Each tick moves at most one phase forward.
            assert!(state.phase >= previous);
            if state.phase > previous {
                assert_eq!(previous.next(), Some(state.phase));
            }
            previous = state.phase;
        }
        let state = plant.state();
        assert_eq!(state.phase, GrowthPhase::Done);
        assert!(state.height_cm > 40.0, "height {}", state.height_cm);
        assert!(state.height_cm <= 120.0);
        assert!(state.flowers > 5);
        assert!(state.health > 50.0);
    }

    #[test]
    fn test_identical_seeds_identical_trajectories() {
        let table = SetpointTable::default();
        let schedule = PhaseSchedule::default();
        let mut a = GrowthSimulator::new(
            &GrowthConfig::default(),
            schedule.clone(),
            table.clone(),
            3,
            99,
        );
        let mut b = GrowthSimulator::new(
            &GrowthConfig::default(),
            schedule.clone(),
            table.clone(),
            3,
            99,
        );

        for day in 1..=schedule.total_days() {
            let setpoints = table
                .for_phase(a.lead_phase())
                .cloned()
                .unwrap_or_else(|| table.ripening.clone());
            let reading = optimal_reading(&setpoints);
            let sa = a.advance_day(day, &reading).unwrap();
            let sb = b.advance_day(day, &reading).unwrap();
            assert_eq!(sa, sb, "diverged on day {day}");
        }
    }

    proptest! {
        /// Age only ever moves forward, whatever the conditions.
        #[test]
        fn age_is_monotonic(seed in 0u64..1000, temp in -10.0f64..50.0) {
            let table = SetpointTable::default();
            let schedule = PhaseSchedule::default();
            let mut plant = PlantModel::new(1, GrowthConfig::default(), seed);
            let reading = EnvironmentReading {
                temperature_c: temp,
                humidity_percent: 60.0,
                soil_moisture_percent: 70.0,
                light_hours: 13.0,
                irrigation_ml: 75.0,
                ventilation_per_hour: 1.5,
            };
            let mut last_age = 0;
            for day in 1..=30u32 {
                let state = plant.advance(day, &schedule, &table, &reading).unwrap();
                prop_assert!(state.age_days > last_age);
                last_age = state.age_days;
            }
        }
    }
}
