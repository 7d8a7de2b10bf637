//! # Greenhouse Control
//!
//! `Greenhouse` is the IO-free core: environment controller, sensor array
//! and growth model wired into a single per-day tick. `Runner` is the shell
//! around it that owns the collaborators - CSV/JSON logging, the optional
//! MQTT link, the final report - and paces the loop.

pub mod environment;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{GrowthPhase, TickRecord};
use crate::mqtt::MqttLink;
use crate::report::ReportGenerator;
use crate::simulation::{GrowthSimulator, SensorArray, SimulatedSensorArray};
use crate::storage::{DataLogger, RunSummary};

pub use environment::{
    ControlOutput, EnvironmentController, FaultConfig, FaultSeverity, OverrideSet,
};

/// The simulation core: one tick advances the greenhouse by one day.
pub struct Greenhouse {
    env: EnvironmentController,
    sensors: Box<dyn SensorArray>,
    plants: GrowthSimulator,
}

impl Greenhouse {
    pub fn new(cfg: &Config, seed: u64) -> Result<Self> {
        let sensors = Box::new(SimulatedSensorArray::new(
            cfg.sensors.clone(),
            seed.wrapping_add(1),
        )?);
        Self::with_sensors(cfg, seed, sensors)
    }

    /// Build with a custom sensor array (tests, future hardware backends).
    pub fn with_sensors(
        cfg: &Config,
        seed: u64,
        sensors: Box<dyn SensorArray>,
    ) -> Result<Self> {
        cfg.schedule.validate()?;
        let env = EnvironmentController::new(cfg.setpoints.clone(), cfg.faults.clone(), seed);
        let plants = GrowthSimulator::new(
            &cfg.growth,
            cfg.schedule.clone(),
            cfg.setpoints.clone(),
            cfg.simulation.plants,
            seed.wrapping_add(100),
        );
        Ok(Self {
            env,
            sensors,
            plants,
        })
    }

    pub fn lead_phase(&self) -> GrowthPhase {
        self.plants.lead_phase()
    }

    pub fn all_terminal(&self) -> bool {
        self.plants.all_terminal()
    }

    /// Run one simulated day: actuate for the current phase, sample the
    /// sensors, grow the plants, and snapshot everything for the
    /// collaborators.
    pub async fn tick(&mut self, day: u32, overrides: &OverrideSet) -> Result<TickRecord> {
        let phase = self.plants.lead_phase();
        let control = self.env.actuate(phase, overrides)?;
        let reading = self.sensors.sample(&control.actuation).await?;
        let plants = self.plants.advance_day(day, &reading)?;

        let phase = plants
            .iter()
            .find(|p| !p.is_terminal())
            .or_else(|| plants.first())
            .map(|p| p.phase)
            .unwrap_or(GrowthPhase::Done);

        Ok(TickRecord {
            day,
            phase,
            timestamp: Local::now(),
            setpoints: control.setpoints,
            actuation: control.actuation,
            reading,
            fault: control.fault,
            plants,
        })
    }
}

/// Everything a finished run leaves behind.
pub struct RunOutcome {
    pub summary: RunSummary,
    pub data_file: PathBuf,
    pub summary_file: PathBuf,
    pub report_file: PathBuf,
}

/// Drives the greenhouse through the growing cycle and feeds every tick to
/// the logging, messaging and reporting collaborators.
pub struct Runner {
    cfg: Config,
    greenhouse: Greenhouse,
    overrides: Arc<RwLock<OverrideSet>>,
    logger: DataLogger,
    mqtt: Option<MqttLink>,
    shutdown: Arc<AtomicBool>,
}

impl Runner {
    pub fn new(cfg: Config) -> Result<Self> {
        let seed = match cfg.simulation.seed {
            Some(seed) => {
                info!(seed, "using configured random seed");
                seed
            }
            None => {
                let seed = rand::thread_rng().gen();
                info!(seed, "using entropy seed");
                seed
            }
        };

        let greenhouse = Greenhouse::new(&cfg, seed)?;
        let run_id = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let logger = DataLogger::new(&cfg.storage, &run_id, cfg.simulation.plants.max(1))?;

        let overrides = Arc::new(RwLock::new(OverrideSet::default()));
        let mqtt = match cfg.mqtt.broker.as_deref() {
            Some(broker) => Some(MqttLink::connect(&cfg.mqtt, broker, overrides.clone())?),
            None => None,
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        tokio::spawn(async move {
            crate::telemetry::shutdown_signal().await;
            flag.store(true, Ordering::SeqCst);
        });

        Ok(Self {
            cfg,
            greenhouse,
            overrides,
            logger,
            mqtt,
            shutdown,
        })
    }

    pub async fn run(mut self) -> Result<RunOutcome> {
        // One extra day past the schedule lets the last phase retire to Done.
        let total = self
            .cfg
            .simulation
            .max_days
            .unwrap_or(self.cfg.schedule.total_days() + 1);
        let mut records: Vec<TickRecord> = Vec::new();

        for day in 1..=total {
            if self.shutdown.load(Ordering::SeqCst) {
                warn!(day, "shutdown requested, ending run early");
                break;
            }

            let overrides = self.overrides.read().await.clone();
            let record = self
                .greenhouse
                .tick(day, &overrides)
                .await
                .with_context(|| format!("simulating day {day}"))?;

            self.log_progress(&record);
            self.logger
                .append(&record)
                .context("writing tick record")?;
            if let Some(mqtt) = &self.mqtt {
                mqtt.publish_tick(&record).await;
            }
            records.push(record);

            if self.greenhouse.all_terminal() {
                info!(day, "all plants reached a terminal phase");
                break;
            }
            if self.cfg.simulation.interactive {
                tokio::time::sleep(Duration::from_secs(self.cfg.simulation.tick_seconds.max(1)))
                    .await;
            }
        }

        let summary = RunSummary::from_records(self.logger.run_id(), &records);
        let summary_file = self.logger.write_summary(&summary)?;
        let report_file =
            ReportGenerator::new(&self.cfg.storage.reports_dir).summary_report(&records, &summary)?;
        self.log_final(&summary);

        Ok(RunOutcome {
            data_file: self.logger.data_file().to_path_buf(),
            summary,
            summary_file,
            report_file,
        })
    }

    fn log_progress(&self, record: &TickRecord) {
        if let Some(plant) = record.lead_plant() {
            info!(
                day = record.day,
                phase = %record.phase,
                height_cm = plant.height_cm,
                root_cm = plant.root_depth_cm,
                flowers = plant.flowers,
                health = plant.health,
                temperature_c = record.reading.temperature_c,
                irrigation_ml = record.reading.irrigation_ml,
                status = plant.status().describe(),
                "day complete"
            );
        }
        if let Some(fault) = &record.fault {
            warn!(day = record.day, parameter = %fault.parameter, "{}", fault.description);
        }
    }

    fn log_final(&self, summary: &RunSummary) {
        for plant in &summary.plants {
            info!(
                plant = plant.plant_id,
                phase = %plant.final_phase,
                height_cm = plant.final_height_cm,
                root_cm = plant.final_root_depth_cm,
                flowers = plant.final_flowers,
                health = plant.final_health,
                appearance = plant.final_appearance,
                "final plant metrics"
            );
        }
        info!(
            days = summary.days_simulated,
            faults = summary.faults.total,
            "simulation finished"
        );
    }
}
