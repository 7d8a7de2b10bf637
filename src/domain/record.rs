use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{Actuation, EnvironmentReading, Fault, GrowthPhase, PlantState, Setpoints};

/// Per-tick snapshot handed to the logging, reporting and messaging
/// collaborators. The core never reads these back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    pub day: u32,
    pub phase: GrowthPhase,
    pub timestamp: DateTime<Local>,
    pub setpoints: Setpoints,
    pub actuation: Actuation,
    pub reading: EnvironmentReading,
    pub fault: Option<Fault>,
    pub plants: Vec<PlantState>,
}

impl TickRecord {
    /// The first plant still progressing through the cycle, if any.
    pub fn lead_plant(&self) -> Option<&PlantState> {
        self.plants
            .iter()
            .find(|p| !p.is_terminal())
            .or_else(|| self.plants.first())
    }
}
