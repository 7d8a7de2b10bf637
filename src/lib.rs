//! # Flax Greenhouse Controller
//!
//! Educational simulation of an indoor greenhouse growing flax over an
//! 80-day cycle. The growth model and the environmental controller form the
//! core; CLI, MQTT messaging, CSV/JSON logging and HTML reporting are thin
//! collaborators around it.

pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod mqtt;
pub mod report;
pub mod simulation;
pub mod storage;
pub mod telemetry;
