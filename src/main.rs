use anyhow::Result;
use clap::Parser;
use flax_greenhouse_controller::{cli::Args, config::Config, controller::Runner, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let mut cfg = Config::load()?;
    args.apply(&mut cfg);
    cfg.schedule.validate()?;

    if !args.simulate {
        info!("no hardware drivers in this build, running in simulation mode");
    }
    info!(
        days = cfg.schedule.total_days(),
        plants = cfg.simulation.plants,
        mqtt = cfg.mqtt.broker.as_deref().unwrap_or("disabled"),
        "starting flax greenhouse controller"
    );

    let runner = Runner::new(cfg)?;
    let outcome = runner.run().await?;

    info!(
        data = %outcome.data_file.display(),
        summary = %outcome.summary_file.display(),
        report = %outcome.report_file.display(),
        "run complete"
    );
    Ok(())
}
