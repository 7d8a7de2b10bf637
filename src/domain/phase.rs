use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Phase-related errors
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("day {0} is before the start of the growing schedule")]
    DayBeforeSchedule(u32),
    #[error("phase schedule has a gap or overlap around day {0}")]
    BrokenSchedule(u32),
    #[error("no environment parameters for terminal phase '{0}'")]
    Terminal(GrowthPhase),
}

/// Stage of the flax growing cycle.
///
/// Phases advance strictly in declaration order; `Done` is reached after the
/// last scheduled day and `Dead` only through health collapse. Neither
/// terminal phase can be left again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GrowthPhase {
    Germination,
    Growth,
    Flowering,
    Ripening,
    Done,
    Dead,
}

impl GrowthPhase {
    /// The phase that follows this one in the normal cycle, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Germination => Some(Self::Growth),
            Self::Growth => Some(Self::Flowering),
            Self::Flowering => Some(Self::Ripening),
            Self::Ripening => Some(Self::Done),
            Self::Done | Self::Dead => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Dead)
    }
}

/// Day ranges (inclusive, 1-based) for each phase of the growing cycle.
///
/// The default is the 80-day indoor flax cycle. Ranges must be contiguous
/// and start at day 1; `validate` rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSchedule {
    pub germination: (u32, u32),
    pub growth: (u32, u32),
    pub flowering: (u32, u32),
    pub ripening: (u32, u32),
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            germination: (1, 10),
            growth: (11, 60),
            flowering: (61, 70),
            ripening: (71, 80),
        }
    }
}

impl PhaseSchedule {
    pub fn validate(&self) -> Result<(), PhaseError> {
        if self.germination.0 != 1 {
            return Err(PhaseError::BrokenSchedule(self.germination.0));
        }
        for (a, b) in [
            (self.germination, self.growth),
            (self.growth, self.flowering),
            (self.flowering, self.ripening),
        ] {
            if a.1 < a.0 || b.0 != a.1 + 1 {
                return Err(PhaseError::BrokenSchedule(b.0));
            }
        }
        if self.ripening.1 < self.ripening.0 {
            return Err(PhaseError::BrokenSchedule(self.ripening.0));
        }
        Ok(())
    }

    /// Number of growing days in the full cycle.
    pub fn total_days(&self) -> u32 {
        self.ripening.1
    }

    /// The phase scheduled for a 1-based simulation day.
    ///
    /// Days past the end of the cycle map to `Done`; day 0 is an error.
    pub fn phase_for_day(&self, day: u32) -> Result<GrowthPhase, PhaseError> {
        if day == 0 {
            return Err(PhaseError::DayBeforeSchedule(day));
        }
        let phase = if day <= self.germination.1 {
            GrowthPhase::Germination
        } else if day <= self.growth.1 {
            GrowthPhase::Growth
        } else if day <= self.flowering.1 {
            GrowthPhase::Flowering
        } else if day <= self.ripening.1 {
            GrowthPhase::Ripening
        } else {
            GrowthPhase::Done
        };
        Ok(phase)
    }

    /// Inclusive day range of a phase, `None` for terminal phases.
    pub fn span(&self, phase: GrowthPhase) -> Option<(u32, u32)> {
        match phase {
            GrowthPhase::Germination => Some(self.germination),
            GrowthPhase::Growth => Some(self.growth),
            GrowthPhase::Flowering => Some(self.flowering),
            GrowthPhase::Ripening => Some(self.ripening),
            GrowthPhase::Done | GrowthPhase::Dead => None,
        }
    }

    /// 1-based day number within the given phase.
    pub fn phase_day(&self, phase: GrowthPhase, day: u32) -> Option<u32> {
        let (start, end) = self.span(phase)?;
        if day < start || day > end {
            return None;
        }
        Some(day - start + 1)
    }

    /// Length of the given phase in days.
    pub fn phase_len(&self, phase: GrowthPhase) -> Option<u32> {
        self.span(phase).map(|(start, end)| end - start + 1)
    }

    /// Fraction of the phase elapsed at the given day, in `[0, 1]`.
    pub fn progress(&self, phase: GrowthPhase, day: u32) -> f64 {
        match (self.phase_day(phase, day), self.phase_len(phase)) {
            (Some(d), Some(len)) if len > 0 => d as f64 / len as f64,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, GrowthPhase::Germination)]
    #[case(10, GrowthPhase::Germination)]
    #[case(11, GrowthPhase::Growth)]
    #[case(60, GrowthPhase::Growth)]
    #[case(61, GrowthPhase::Flowering)]
    #[case(70, GrowthPhase::Flowering)]
    #[case(71, GrowthPhase::Ripening)]
    #[case(80, GrowthPhase::Ripening)]
    #[case(81, GrowthPhase::Done)]
    fn test_phase_for_day(#[case] day: u32, #[case] expected: GrowthPhase) {
        let schedule = PhaseSchedule::default();
        assert_eq!(schedule.phase_for_day(day).unwrap(), expected);
    }

    #[test]
    fn test_day_zero_is_rejected() {
        let schedule = PhaseSchedule::default();
        assert!(schedule.phase_for_day(0).is_err());
    }

    #[test]
    fn test_default_schedule_validates() {
        assert!(PhaseSchedule::default().validate().is_ok());
    }

    #[test]
    fn test_gap_in_schedule_is_rejected() {
        let schedule = PhaseSchedule {
            growth: (12, 60),
            ..Default::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_overlap_in_schedule_is_rejected() {
        let schedule = PhaseSchedule {
            flowering: (60, 70),
            ..Default::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_phase_ordering() {
        let mut phase = GrowthPhase::Germination;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            assert!(next > phase);
            seen.push(next);
            phase = next;
        }
        assert_eq!(phase, GrowthPhase::Done);
        assert_eq!(seen.len(), 5);
        assert!(GrowthPhase::Dead.next().is_none());
    }

    #[test]
    fn test_phase_string_round_trip() {
        assert_eq!(GrowthPhase::Flowering.to_string(), "flowering");
        assert_eq!("ripening".parse::<GrowthPhase>().unwrap(), GrowthPhase::Ripening);
        assert!("sprouting".parse::<GrowthPhase>().is_err());
    }

    #[test]
    fn test_progress_spans_phase() {
        let schedule = PhaseSchedule::default();
        assert!((schedule.progress(GrowthPhase::Germination, 1) - 0.1).abs() < 1e-9);
        assert!((schedule.progress(GrowthPhase::Germination, 10) - 1.0).abs() < 1e-9);
        assert_eq!(schedule.progress(GrowthPhase::Done, 81), 0.0);
    }

    proptest! {
        /// Later days never map to earlier phases.
        #[test]
        fn phase_is_monotonic_in_day(day in 1u32..200, offset in 0u32..50) {
            let schedule = PhaseSchedule::default();
            let earlier = schedule.phase_for_day(day).unwrap();
            let later = schedule.phase_for_day(day + offset).unwrap();
            prop_assert!(later >= earlier);
        }
    }
}
