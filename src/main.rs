use anyhow::Context;
use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sailsense::config::{PulseFilter, SensorsConfig};
use sailsense::output::{
    Delta, FnSink, MessageSink, OutputFormat, WriterSink, create_formatter, paths,
};
use sailsense::scheduler::Sensors;
use sailsense::simulation::{Scenario, simulated_hardware};
use sailsense::units::ms_to_kn;

#[derive(Parser, Debug)]
#[command(name = "sailsense")]
#[command(about = "Run the sail instrument sensor core against a simulated boat", long_about = None)]
struct Args {
    /// Sensor configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Sailing scenario (TOML)
    #[arg(short = 's', long)]
    scenario: Option<PathBuf>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Run time in seconds
    #[arg(short = 'd', long, default_value = "10")]
    duration: f64,

    /// Seed for the simulated noise
    #[arg(long)]
    seed: Option<u64>,

    /// Override the paddle wheel filter, e.g. iir:3 or average:8
    #[arg(long)]
    water_filter: Option<PulseFilter>,

    /// Override the anemometer filter, e.g. iir:3 or average:8
    #[arg(long)]
    wind_filter: Option<PulseFilter>,

    /// Print wind and water statistics at shutdown
    #[arg(long)]
    summary: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f64>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

/// Published values accumulated over a run, knots and degrees
struct RunStats {
    true_wind_speed: Stats<f64>,
    true_wind_angle: Stats<f64>,
    apparent_wind_speed: Stats<f64>,
    water_speed: Stats<f64>,
}

impl RunStats {
    fn new() -> Self {
        Self {
            true_wind_speed: Stats::new(),
            true_wind_angle: Stats::new(),
            apparent_wind_speed: Stats::new(),
            water_speed: Stats::new(),
        }
    }

    fn record(&mut self, delta: &Delta) {
        let value = |path| delta.value(path).map(|v| v.as_f64());
        if let Some(v) = value(paths::TRUE_WIND_SPEED) {
            self.true_wind_speed.update(ms_to_kn(v));
        }
        if let Some(v) = value(paths::TRUE_WIND_ANGLE) {
            self.true_wind_angle.update(v.to_degrees());
        }
        if let Some(v) = value(paths::APPARENT_WIND_SPEED) {
            self.apparent_wind_speed.update(ms_to_kn(v));
        }
        if let Some(v) = value(paths::WATER_SPEED) {
            self.water_speed.update(ms_to_kn(v));
        }
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            true_wind_speed_kn: StatsSummary::from_stats(&self.true_wind_speed),
            true_wind_angle_deg: StatsSummary::from_stats(&self.true_wind_angle),
            apparent_wind_speed_kn: StatsSummary::from_stats(&self.apparent_wind_speed),
            water_speed_kn: StatsSummary::from_stats(&self.water_speed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RunSummary {
    true_wind_speed_kn: Option<StatsSummary>,
    true_wind_angle_deg: Option<StatsSummary>,
    apparent_wind_speed_kn: Option<StatsSummary>,
    water_speed_kn: Option<StatsSummary>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => SensorsConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SensorsConfig::default(),
    };
    if let Some(filter) = args.water_filter {
        config.water_sensor.filter = filter;
    }
    if let Some(filter) = args.wind_filter {
        config.wind_sensor.filter = filter;
    }

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("Failed to load scenario {}", path.display()))?,
        None => Scenario::default(),
    };
    if args.seed.is_some() {
        scenario.seed = args.seed;
    }
    if !(args.duration.is_finite() && args.duration >= 0.0) {
        anyhow::bail!("Invalid duration {}", args.duration);
    }

    let (aws, awa) = scenario.apparent_wind();
    log::info!(
        "Scenario: TWS {:.1} kn at {:.0}°, STW {:.1} kn, expected AWS {:.1} kn at {:.0}°",
        ms_to_kn(scenario.true_wind_speed),
        scenario.true_wind_angle.to_degrees(),
        ms_to_kn(scenario.boat_speed),
        ms_to_kn(aws),
        awa.to_degrees()
    );

    let hardware = simulated_hardware(&scenario, &config)?;
    let run_stats = Arc::new(Mutex::new(RunStats::new()));
    let sink_stats = Arc::clone(&run_stats);
    let mut writer = WriterSink::new(
        std::io::stdout(),
        create_formatter(args.format, args.verbose > 0),
    );
    let sink = FnSink(move |delta: &Delta| {
        writer.publish(delta);
        if let Ok(mut stats) = sink_stats.lock() {
            stats.record(delta);
        }
    });

    let mut sensors = Sensors::start(sink, config, hardware)?;
    std::thread::sleep(Duration::from_secs_f64(args.duration));
    sensors.close();

    if args.summary {
        let summary = run_stats
            .lock()
            .map_err(|_| anyhow::anyhow!("Statistics lock poisoned"))?
            .summary();
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            _ => print_summary(&summary),
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "{:<24} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Quantity", "Mean", "Std", "Min", "Max", "Samples"
    );
    println!("{}", "-".repeat(69));
    let rows = [
        ("True wind speed (kn)", &summary.true_wind_speed_kn),
        ("True wind angle (°)", &summary.true_wind_angle_deg),
        ("Apparent wind (kn)", &summary.apparent_wind_speed_kn),
        ("Water speed (kn)", &summary.water_speed_kn),
    ];
    for (name, stats) in rows {
        match stats {
            Some(s) => println!(
                "{:<24} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8}",
                name, s.mean, s.std_dev, s.min, s.max, s.count
            ),
            None => println!("{:<24} {:>8}", name, "-"),
        }
    }
}
