//! # Greenhouse Simulation Module
//!
//! Provides the simulated pieces of the greenhouse that would be physical in
//! a real installation.
//!
//! ## Components
//!
//! - **Growth**: per-plant flax growth model with phase-specific rates,
//!   stress response and health tracking
//! - **Sensors**: simulated sensor array that turns applied actuation into
//!   noisy environment readings
//!
//! All randomness is drawn from seeded generators so that two runs with the
//! same seed produce identical trajectories.

pub mod growth;
pub mod sensors;

pub use growth::{GrowthConfig, GrowthError, GrowthSimulator, PlantModel};
pub use sensors::{FixedSensorArray, SensorArray, SensorNoiseConfig, SimulatedSensorArray};
