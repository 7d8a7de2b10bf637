//! # Run Report
//!
//! Renders a self-contained HTML report from the recorded tick snapshots:
//! run overview, per-phase environment averages, final plant metrics and a
//! simple growth curve. Charting/animation beyond this stays with external
//! tools; they can consume the same CSV the logger writes.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::TickRecord;
use crate::storage::RunSummary;

pub struct ReportGenerator {
    save_path: PathBuf,
}

impl ReportGenerator {
    pub fn new(save_path: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
        }
    }

    pub fn summary_report(
        &self,
        records: &[TickRecord],
        summary: &RunSummary,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.save_path)
            .with_context(|| format!("creating report directory {}", self.save_path.display()))?;
        let file = self.save_path.join(format!("{}_report.html", summary.run_id));
        fs::write(&file, render(records, summary))
            .with_context(|| format!("writing {}", file.display()))?;
        info!(path = %file.display(), "run report written");
        Ok(file)
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }
}

fn render(records: &[TickRecord], summary: &RunSummary) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Flax Greenhouse Run {id}</title>\n<style>\n\
         body {{ font-family: sans-serif; margin: 2em; color: #222; }}\n\
         table {{ border-collapse: collapse; margin-bottom: 1.5em; }}\n\
         th, td {{ border: 1px solid #bbb; padding: 4px 10px; text-align: right; }}\n\
         th {{ background: #e8f0e8; }}\n\
         h1, h2 {{ color: #228B22; }}\n\
         </style>\n</head>\n<body>\n<h1>Flax Greenhouse Run {id}</h1>\n",
        id = summary.run_id
    );

    let _ = write!(
        html,
        "<h2>Overview</h2>\n<table>\n\
         <tr><th>Days simulated</th><td>{}</td></tr>\n\
         <tr><th>Plants</th><td>{}</td></tr>\n\
         <tr><th>Faults injected</th><td>{}</td></tr>\n\
         </table>\n",
        summary.days_simulated, summary.num_plants, summary.faults.total
    );

    html.push_str(
        "<h2>Environment by phase</h2>\n<table>\n<tr><th>Phase</th><th>Days</th>\
         <th>Avg temp (&deg;C)</th><th>Avg ventilation (/hr)</th>\
         <th>Avg irrigation (ml)</th><th>Avg light (hrs)</th><th>Faults</th></tr>\n",
    );
    for (phase, stats) in &summary.phases {
        let _ = write!(
            html,
            "<tr><td>{phase}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td></tr>\n",
            stats.days,
            stats.avg_temperature_c,
            stats.avg_ventilation_per_hour,
            stats.avg_irrigation_ml,
            stats.avg_light_hours,
            stats.faults
        );
    }
    html.push_str("</table>\n");

    html.push_str(
        "<h2>Final plant metrics</h2>\n<table>\n<tr><th>Plant</th><th>Phase</th>\
         <th>Height (cm)</th><th>Roots (cm)</th><th>Flowers</th><th>Health</th>\
         <th>Appearance</th><th>Height growth (cm/day)</th></tr>\n",
    );
    for plant in &summary.plants {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.2}</td></tr>\n",
            plant.plant_id,
            plant.final_phase,
            plant.final_height_cm,
            plant.final_root_depth_cm,
            plant.final_flowers,
            plant.final_health,
            plant.final_appearance,
            plant.height_cm_per_day
        );
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Growth curve</h2>\n");
    html.push_str(&height_chart(records));

    let faults: Vec<&TickRecord> = records.iter().filter(|r| r.fault.is_some()).collect();
    if !faults.is_empty() {
        html.push_str("<h2>Fault log</h2>\n<table>\n<tr><th>Day</th><th>Description</th></tr>\n");
        for record in faults {
            if let Some(fault) = &record.fault {
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td style=\"text-align:left\">{}</td></tr>\n",
                    record.day, fault.description
                );
            }
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Inline SVG polyline of the lead plant's height over the run.
fn height_chart(records: &[TickRecord]) -> String {
    let points: Vec<(u32, f64)> = records
        .iter()
        .filter_map(|r| r.lead_plant().map(|p| (r.day, p.height_cm)))
        .collect();
    if points.is_empty() {
        return "<p>No data recorded.</p>\n".to_string();
    }

    let max_day = points.last().map(|(d, _)| *d).unwrap_or(1).max(1);
    let max_height = points
        .iter()
        .map(|(_, h)| *h)
        .fold(1.0_f64, f64::max);

    let polyline: Vec<String> = points
        .iter()
        .map(|(day, height)| {
            let x = 40.0 + f64::from(*day) / f64::from(max_day) * 580.0;
            let y = 220.0 - height / max_height * 190.0;
            format!("{x:.1},{y:.1}")
        })
        .collect();

    format!(
        "<svg width=\"640\" height=\"240\" viewBox=\"0 0 640 240\">\n\
         <line x1=\"40\" y1=\"220\" x2=\"620\" y2=\"220\" stroke=\"#999\"/>\n\
         <line x1=\"40\" y1=\"30\" x2=\"40\" y2=\"220\" stroke=\"#999\"/>\n\
         <text x=\"330\" y=\"236\" font-size=\"11\" text-anchor=\"middle\">day (1-{max_day})</text>\n\
         <text x=\"12\" y=\"30\" font-size=\"11\">{max_height:.0}cm</text>\n\
         <polyline fill=\"none\" stroke=\"#228B22\" stroke-width=\"2\" points=\"{}\"/>\n\
         </svg>\n",
        polyline.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Actuation, EnvironmentReading, GrowthPhase, PlantState, SetpointTable,
    };
    use chrono::Local;

    fn records(days: u32) -> Vec<TickRecord> {
        let table = SetpointTable::default();
        (1..=days)
            .map(|day| TickRecord {
                day,
                phase: GrowthPhase::Germination,
                timestamp: Local::now(),
                setpoints: table.germination.clone(),
                actuation: Actuation {
                    temperature_c: 18.0,
                    ventilation_per_hour: 1.5,
                    irrigation_ml: 75.0,
                    light_hours: 13.0,
                },
                reading: EnvironmentReading {
                    temperature_c: 18.0,
                    humidity_percent: 60.0,
                    soil_moisture_percent: 70.0,
                    light_hours: 13.0,
                    irrigation_ml: 75.0,
                    ventilation_per_hour: 1.5,
                },
                fault: None,
                plants: vec![PlantState {
                    height_cm: day as f64 * 0.4,
                    age_days: day,
                    ..PlantState::new(1)
                }],
            })
            .collect()
    }

    #[test]
    fn test_report_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let records = records(5);
        let summary = RunSummary::from_records("testrun", &records);

        let path = ReportGenerator::new(dir.path())
            .summary_report(&records, &summary)
            .unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("testrun"));
        assert!(html.contains("<polyline"));
        assert!(html.contains("germination"));
    }

    #[test]
    fn test_report_survives_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let summary = RunSummary::from_records("empty", &[]);
        let path = ReportGenerator::new(dir.path())
            .summary_report(&[], &summary)
            .unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("No data recorded."));
    }
}
