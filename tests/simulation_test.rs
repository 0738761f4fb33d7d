use approx::assert_abs_diff_eq;
use crossbeam_channel::unbounded;
use std::thread;
use std::time::Duration;

use sailsense::config::SensorsConfig;
use sailsense::output::{ChannelSink, Delta, paths};
use sailsense::scheduler::Sensors;
use sailsense::simulation::{Scenario, simulated_hardware};

fn number(delta: &Delta, path: &str) -> f64 {
    delta.value(path).map(|v| v.as_f64()).unwrap_or(f64::NAN)
}

fn run(scenario: &Scenario, seconds: f64) -> Vec<Delta> {
    let mut config = SensorsConfig::default();
    config.periods.output_ms = 100;
    let hardware = simulated_hardware(scenario, &config).unwrap();
    let (tx, rx) = unbounded();
    let mut sensors = Sensors::start(ChannelSink::new(tx), config, hardware).unwrap();
    thread::sleep(Duration::from_secs_f64(seconds));
    sensors.close();
    rx.try_iter().collect()
}

#[test]
fn test_calm_scenario_recovers_true_wind() {
    let scenario = Scenario::calm()
        .with_seed(11)
        .with_true_wind(6.0, 45f64.to_radians())
        .with_boat_speed(3.0);
    let deltas = run(&scenario, 2.0);
    assert!(deltas.len() >= 10, "only {} deltas", deltas.len());

    let last = deltas.last().unwrap();
    let (aws, awa) = scenario.apparent_wind();
    assert_abs_diff_eq!(number(last, paths::WATER_SPEED), 3.0, epsilon = 0.01);
    assert_abs_diff_eq!(number(last, paths::APPARENT_WIND_SPEED), aws, epsilon = 0.05);
    assert_abs_diff_eq!(number(last, paths::APPARENT_WIND_ANGLE), awa, epsilon = 0.005);
    assert_abs_diff_eq!(number(last, paths::TRUE_WIND_SPEED), 6.0, epsilon = 0.05);
    assert_abs_diff_eq!(
        number(last, paths::TRUE_WIND_ANGLE),
        45f64.to_radians(),
        epsilon = 0.01
    );
    assert_abs_diff_eq!(number(last, paths::LEEWAY), 0.0, epsilon = 1e-12);
    assert!(number(last, paths::LOG) > 0.0);
}

#[test]
fn test_port_tack_scenario() {
    let scenario = Scenario::calm()
        .with_seed(5)
        .with_true_wind(7.0, -60f64.to_radians())
        .with_boat_speed(3.5);
    let deltas = run(&scenario, 1.5);
    let last = deltas.last().unwrap();
    assert!(number(last, paths::APPARENT_WIND_ANGLE) < 0.0);
    assert_abs_diff_eq!(
        number(last, paths::TRUE_WIND_ANGLE),
        -60f64.to_radians(),
        epsilon = 0.01
    );
}

#[test]
fn test_noisy_heeled_scenario_stays_finite() {
    let scenario = Scenario::default().with_seed(3).with_heel(0.15);
    let deltas = run(&scenario, 1.5);
    assert!(!deltas.is_empty());
    for delta in &deltas {
        for value in delta.values() {
            assert!(value.value.as_f64().is_finite(), "{} not finite", value.path);
        }
    }
    let last = deltas.last().unwrap();
    assert!(number(last, paths::ROLL) > 0.05);
    assert!(number(last, paths::LEEWAY) > 0.0);
}
