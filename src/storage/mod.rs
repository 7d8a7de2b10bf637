//! # Data Logging
//!
//! Append-style persistence for offline analysis: one CSV row per tick plus
//! a JSON summary at the end of the run. Each tick is flushed as it is
//! written, so a killed run still leaves a usable log.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::StorageConfig;
use crate::domain::{GrowthPhase, TickRecord};

/// Per-tick CSV writer plus end-of-run JSON summary.
pub struct DataLogger {
    run_id: String,
    data_file: PathBuf,
    summary_file: PathBuf,
    writer: csv::Writer<File>,
}

impl DataLogger {
    pub fn new(cfg: &StorageConfig, run_id: &str, num_plants: u32) -> Result<Self> {
        fs::create_dir_all(&cfg.data_dir)
            .with_context(|| format!("creating data directory {}", cfg.data_dir.display()))?;
        let data_file = cfg.data_dir.join(format!("{run_id}_greenhouse.csv"));
        let summary_file = cfg.data_dir.join(format!("{run_id}_summary.json"));

        let mut writer = csv::Writer::from_path(&data_file)
            .with_context(|| format!("creating {}", data_file.display()))?;

        let mut headers: Vec<String> = [
            "day",
            "timestamp",
            "phase",
            "temperature_c",
            "humidity_percent",
            "soil_moisture_percent",
            "ventilation_per_hour",
            "irrigation_ml",
            "light_hours",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        for p in 1..=num_plants {
            for column in ["height_cm", "root_depth_cm", "flowers", "health", "appearance"] {
                headers.push(format!("plant{p}_{column}"));
            }
        }
        headers.push("fault_active".into());
        headers.push("fault_description".into());
        writer.write_record(&headers)?;
        writer.flush()?;

        Ok(Self {
            run_id: run_id.to_string(),
            data_file,
            summary_file,
            writer,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn append(&mut self, record: &TickRecord) -> Result<()> {
        let mut row = vec![
            record.day.to_string(),
            record.timestamp.to_rfc3339(),
            record.phase.to_string(),
            format!("{:.1}", record.reading.temperature_c),
            format!("{:.1}", record.reading.humidity_percent),
            format!("{:.1}", record.reading.soil_moisture_percent),
            format!("{:.1}", record.reading.ventilation_per_hour),
            format!("{:.1}", record.reading.irrigation_ml),
            format!("{:.1}", record.reading.light_hours),
        ];
        for plant in &record.plants {
            row.push(format!("{:.1}", plant.height_cm));
            row.push(format!("{:.1}", plant.root_depth_cm));
            row.push(plant.flowers.to_string());
            row.push(format!("{:.1}", plant.health));
            row.push(format!("{:.1}", plant.appearance));
        }
        row.push(record.fault.is_some().to_string());
        row.push(
            record
                .fault
                .as_ref()
                .map(|f| f.description.clone())
                .unwrap_or_default(),
        );

        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_summary(&mut self, summary: &RunSummary) -> Result<PathBuf> {
        let file = File::create(&self.summary_file)
            .with_context(|| format!("creating {}", self.summary_file.display()))?;
        serde_json::to_writer_pretty(file, summary)?;
        info!(path = %self.summary_file.display(), "run summary written");
        Ok(self.summary_file.clone())
    }
}

/// Environmental averages and fault count for one phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub days: u32,
    pub avg_temperature_c: f64,
    pub avg_ventilation_per_hour: f64,
    pub avg_irrigation_ml: f64,
    pub avg_light_hours: f64,
    pub faults: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultTally {
    pub total: u32,
    pub by_parameter: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantSummary {
    pub plant_id: u32,
    pub final_phase: GrowthPhase,
    pub final_height_cm: f64,
    pub final_root_depth_cm: f64,
    pub final_flowers: u32,
    pub final_health: f64,
    pub final_appearance: f64,
    pub height_cm_per_day: f64,
    pub root_cm_per_day: f64,
}

/// End-of-run statistics, written as JSON next to the CSV log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub num_plants: u32,
    pub days_simulated: u32,
    pub phases: BTreeMap<String, PhaseSummary>,
    pub faults: FaultTally,
    pub plants: Vec<PlantSummary>,
}

impl RunSummary {
    pub fn from_records(run_id: &str, records: &[TickRecord]) -> Self {
        let mut phases: BTreeMap<String, PhaseSummary> = BTreeMap::new();
        let mut faults = FaultTally::default();

        for record in records {
            let entry = phases.entry(record.phase.to_string()).or_default();
            entry.days += 1;
            entry.avg_temperature_c += record.reading.temperature_c;
            entry.avg_ventilation_per_hour += record.reading.ventilation_per_hour;
            entry.avg_irrigation_ml += record.reading.irrigation_ml;
            entry.avg_light_hours += record.reading.light_hours;

            if let Some(fault) = &record.fault {
                entry.faults += 1;
                faults.total += 1;
                *faults
                    .by_parameter
                    .entry(fault.parameter.to_string())
                    .or_default() += 1;
            }
        }
        for summary in phases.values_mut() {
            let days = f64::from(summary.days.max(1));
            summary.avg_temperature_c = round1(summary.avg_temperature_c / days);
            summary.avg_ventilation_per_hour = round1(summary.avg_ventilation_per_hour / days);
            summary.avg_irrigation_ml = round1(summary.avg_irrigation_ml / days);
            summary.avg_light_hours = round1(summary.avg_light_hours / days);
        }

        let days_simulated = records.last().map(|r| r.day).unwrap_or(0);
        let plants = records
            .last()
            .map(|last| {
                last.plants
                    .iter()
                    .map(|plant| PlantSummary {
                        plant_id: plant.plant_id,
                        final_phase: plant.phase,
                        final_height_cm: round1(plant.height_cm),
                        final_root_depth_cm: round1(plant.root_depth_cm),
                        final_flowers: plant.flowers,
                        final_health: round1(plant.health),
                        final_appearance: round1(plant.appearance),
                        height_cm_per_day: round2(
                            plant.height_cm / f64::from(days_simulated.max(1)),
                        ),
                        root_cm_per_day: round2(
                            plant.root_depth_cm / f64::from(days_simulated.max(1)),
                        ),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            run_id: run_id.to_string(),
            num_plants: records
                .last()
                .map(|r| r.plants.len() as u32)
                .unwrap_or(0),
            days_simulated,
            phases,
            faults,
            plants,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
