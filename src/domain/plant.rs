use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::GrowthPhase;

/// Full state of one plant, advanced once per simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    pub plant_id: u32,
    pub phase: GrowthPhase,
    /// Simulation days lived so far; never decreases.
    pub age_days: u32,
    pub height_cm: f64,
    pub root_depth_cm: f64,
    pub flowers: u32,
    /// 0-100; the plant dies when this reaches 0.
    pub health: f64,
    /// 0-1 instantaneous stress from the latest conditions.
    pub stress: f64,
    /// 0-10 cosmetic rating.
    pub appearance: f64,
}

impl PlantState {
    pub fn new(plant_id: u32) -> Self {
        Self {
            plant_id,
            phase: GrowthPhase::Germination,
            age_days: 0,
            height_cm: 0.0,
            root_depth_cm: 0.0,
            flowers: 0,
            health: 100.0,
            stress: 0.0,
            appearance: 3.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn status(&self) -> PlantStatus {
        if self.phase == GrowthPhase::Dead {
            PlantStatus::Dead
        } else if self.appearance >= 8.0 {
            PlantStatus::Thriving
        } else if self.appearance >= 6.0 {
            PlantStatus::Healthy
        } else if self.appearance >= 4.0 {
            PlantStatus::Average
        } else if self.appearance >= 2.0 {
            PlantStatus::Struggling
        } else {
            PlantStatus::Critical
        }
    }
}

/// Coarse condition bucket derived from appearance, for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlantStatus {
    Thriving,
    Healthy,
    Average,
    Struggling,
    Critical,
    Dead,
}

impl PlantStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Thriving => "Thriving - Vibrant and healthy",
            Self::Healthy => "Healthy - Growing well",
            Self::Average => "Average - Some minor issues",
            Self::Struggling => "Struggling - Visible stress signs",
            Self::Critical => "Critical - Severe stress",
            Self::Dead => "Dead - Growth has stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(9.0, PlantStatus::Thriving)]
    #[case(8.0, PlantStatus::Thriving)]
    #[case(6.5, PlantStatus::Healthy)]
    #[case(4.0, PlantStatus::Average)]
    #[case(2.5, PlantStatus::Struggling)]
    #[case(1.0, PlantStatus::Critical)]
    fn test_status_from_appearance(#[case] appearance: f64, #[case] expected: PlantStatus) {
        let state = PlantState {
            appearance,
            ..PlantState::new(1)
        };
        assert_eq!(state.status(), expected);
    }

    #[test]
    fn test_dead_phase_wins_over_appearance() {
        let state = PlantState {
            phase: GrowthPhase::Dead,
            appearance: 9.0,
            ..PlantState::new(1)
        };
        assert_eq!(state.status(), PlantStatus::Dead);
    }

    #[test]
    fn test_new_plant_defaults() {
        let state = PlantState::new(3);
        assert_eq!(state.plant_id, 3);
        assert_eq!(state.phase, GrowthPhase::Germination);
        assert_eq!(state.age_days, 0);
        assert_eq!(state.health, 100.0);
        assert!(!state.is_terminal());
    }
}
