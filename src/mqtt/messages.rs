use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::{EnvParameter, EnvironmentReading, Fault, GrowthPhase, PlantState, TickRecord};

/// Remote override request: pins one environment parameter to a value until
/// cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverrideCommand {
    pub parameter: EnvParameter,
    pub value: f64,
}

/// Clears one override, or all of them when no parameter is given.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClearOverrideCommand {
    #[serde(default)]
    pub parameter: Option<EnvParameter>,
}

/// Telemetry published on `<prefix>/status` after every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub day: u32,
    pub phase: GrowthPhase,
    pub timestamp: DateTime<Local>,
    pub plants: Vec<PlantState>,
    pub reading: EnvironmentReading,
    pub fault: Option<Fault>,
}

impl From<&TickRecord> for StatusMessage {
    fn from(record: &TickRecord) -> Self {
        Self {
            day: record.day,
            phase: record.phase,
            timestamp: record.timestamp,
            plants: record.plants.clone(),
            reading: record.reading,
            fault: record.fault.clone(),
        }
    }
}

/// Raw sensor telemetry published on `<prefix>/sensor_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorMessage {
    pub day: u32,
    pub timestamp: DateTime<Local>,
    pub reading: EnvironmentReading,
}

impl From<&TickRecord> for SensorMessage {
    fn from(record: &TickRecord) -> Self {
        Self {
            day: record.day,
            timestamp: record.timestamp,
            reading: record.reading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_command_round_trip() {
        let cmd = OverrideCommand {
            parameter: EnvParameter::LightHours,
            value: 16.0,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("light_hours"));
        let back: OverrideCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_clear_command_accepts_empty_object() {
        let cmd: ClearOverrideCommand = serde_json::from_str("{}").unwrap();
        assert_eq!(cmd.parameter, None);

        let cmd: ClearOverrideCommand =
            serde_json::from_str(r#"{"parameter": "irrigation"}"#).unwrap();
        assert_eq!(cmd.parameter, Some(EnvParameter::Irrigation));
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        assert!(serde_json::from_str::<OverrideCommand>(r#"{"parameter": "sunshine", "value": 1}"#).is_err());
        assert!(serde_json::from_str::<OverrideCommand>("not json").is_err());
    }
}
