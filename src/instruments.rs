//! The aggregate state shared by the scheduler tasks.

use chrono::{DateTime, Utc};

use crate::config::{SensorsConfig, WindVaneConfig};
use crate::constants::OUTPUT_PRECISION;
use crate::error::Result;
use crate::hardware::{DigitalEdgeSource, OrientationSample};
use crate::orientation::{Pose, RateGyro};
use crate::output::{Delta, PathValue, Value, paths};
use crate::pulse::PulseFrequencyMeter;
use crate::stats::{AngularStatistic, RunningStatistic};
use crate::units::to_precision;
use crate::wind::{CorrectionPipeline, CycleSnapshot, NavigationState};

/// Meters, statistics and the latest derived state
///
/// Owned by the scheduler thread; only the pulse meters' edge state is
/// touched from another context.
pub struct Instruments {
    context: String,
    wind_meter: PulseFrequencyMeter,
    water_meter: PulseFrequencyMeter,
    pose: Pose,
    rate_gyro: RateGyro,
    wind_angle: AngularStatistic,
    raw_sin_volts: RunningStatistic,
    raw_cos_volts: RunningStatistic,
    vane: WindVaneConfig,
    pipeline: CorrectionPipeline,
}

impl Instruments {
    /// Register both pulse meters on `edges` and set up empty statistics
    pub fn new(config: &SensorsConfig, edges: &mut dyn DigitalEdgeSource) -> Result<Self> {
        let heel_corrections = config.heel_correction_table()?;
        let water_meter = PulseFrequencyMeter::register(edges, &config.water_sensor)?;
        let wind_meter = PulseFrequencyMeter::register(edges, &config.wind_sensor)?;
        let stats = &config.statistics;

        Ok(Self {
            context: config.context(),
            wind_meter,
            water_meter,
            pose: Pose::new(stats.pose_window),
            rate_gyro: RateGyro::new(stats.rate_window),
            wind_angle: AngularStatistic::new(stats.wind_angle_window),
            raw_sin_volts: RunningStatistic::new(stats.vane_voltage_window),
            raw_cos_volts: RunningStatistic::new(stats.vane_voltage_window),
            vane: config.wind_vane.clone(),
            pipeline: CorrectionPipeline::new(config.boat.clone(), heel_corrections),
        })
    }

    pub fn apply_orientation(&mut self, sample: &OrientationSample) {
        self.pose.set(&sample.fusion_pose);
        self.rate_gyro.set(&sample.gyro);
    }

    /// ADC channels to read each wind period, sine first
    pub fn vane_channels(&self) -> [u8; 2] {
        [self.vane.sin_channel, self.vane.cos_channel]
    }

    /// Record one pair of vane voltages
    ///
    /// Raw volts feed the published means; normalized components feed the
    /// wind angle statistic.
    pub fn apply_vane_voltages(&mut self, sin_volts: f64, cos_volts: f64) {
        self.raw_sin_volts.set(sin_volts);
        self.raw_cos_volts.set(cos_volts);
        self.wind_angle.set_sc(
            self.vane.sin.normalize(sin_volts),
            self.vane.cos.normalize(cos_volts),
        );
    }

    /// Read both meters and run one correction cycle
    pub fn run_calculation(&mut self) -> &NavigationState {
        let snapshot = CycleSnapshot {
            roll: self.pose.roll.mean(),
            pitch: self.pose.pitch.mean(),
            yaw: self.pose.yaw.mean(),
            roll_rate: self.rate_gyro.roll.mean(),
            pitch_rate: self.rate_gyro.pitch.mean(),
            vane_sin: self.wind_angle.sin_mean(),
            vane_cos: self.wind_angle.cos_mean(),
            water: self.water_meter.read(),
            wind: self.wind_meter.read(),
        };
        self.pipeline.run(&snapshot)
    }

    pub fn navigation(&self) -> &NavigationState {
        self.pipeline.state()
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn rate_gyro(&self) -> &RateGyro {
        &self.rate_gyro
    }

    pub fn wind_angle(&self) -> &AngularStatistic {
        &self.wind_angle
    }

    pub fn delta(&self) -> Delta {
        self.delta_at(Utc::now())
    }

    /// Build the published delta from the latest cycle
    pub fn delta_at(&self, timestamp: DateTime<Utc>) -> Delta {
        let nav = self.pipeline.state();
        let count = |path, n: u64| PathValue {
            path,
            value: Value::Count(n),
        };
        let number = |path, v: f64| PathValue {
            path,
            value: Value::Number(to_precision(v, OUTPUT_PRECISION)),
        };

        let values = vec![
            count(paths::TIMESTAMP, timestamp.timestamp_millis().max(0) as u64),
            count(paths::WIND_PULSES, self.wind_meter.pulse_count()),
            count(paths::WATER_PULSES, self.water_meter.pulse_count()),
            number(paths::VANE_SIN_VOLTS, self.raw_sin_volts.mean()),
            number(paths::VANE_COS_VOLTS, self.raw_cos_volts.mean()),
            number(paths::HEADING, nav.heading),
            number(paths::RATE_OF_TURN, self.rate_gyro.yaw.mean()),
            number(paths::ROLL, self.pose.roll.mean()),
            number(paths::PITCH, self.pose.pitch.mean()),
            number(paths::YAW, self.pose.yaw.mean()),
            number(paths::APPARENT_WIND_SPEED, nav.wind.apparent_speed),
            number(paths::APPARENT_WIND_ANGLE, nav.wind.apparent_angle),
            number(paths::TRUE_WIND_SPEED, nav.wind.true_speed),
            number(paths::TRUE_WIND_ANGLE, nav.wind.true_angle),
            number(paths::LEEWAY, nav.leeway),
            number(paths::WATER_SPEED, nav.water_speed),
            number(paths::LOG, nav.water_distance),
        ];
        Delta::new(self.context.clone(), timestamp, values)
    }

    /// Release both edge registrations; repeat calls do nothing
    pub fn close(&mut self) {
        self.wind_meter.close();
        self.water_meter.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::Vector3;
    use crate::hardware::mock::ManualEdgeSource;
    use std::f64::consts::FRAC_PI_2;

    fn instruments(source: &mut ManualEdgeSource) -> Instruments {
        Instruments::new(&SensorsConfig::default(), source).unwrap()
    }

    #[test]
    fn test_registers_both_meters() {
        let mut source = ManualEdgeSource::new();
        let mut inst = instruments(&mut source);
        assert!(source.is_registered(6));
        assert!(source.is_registered(7));
        inst.close();
        assert!(!source.is_registered(6));
        assert!(!source.is_registered(7));
        inst.close();
    }

    #[test]
    fn test_failed_wind_registration_releases_water() {
        let mut source = ManualEdgeSource::new();
        let mut config = SensorsConfig::default();
        config.wind_sensor.calibration.clear();
        assert!(Instruments::new(&config, &mut source).is_err());
        assert!(!source.is_registered(7));
    }

    #[test]
    fn test_vane_voltages_feed_wind_angle() {
        let mut source = ManualEdgeSource::new();
        let mut inst = instruments(&mut source);
        // sine at full scale, cosine mid-span: wind on the starboard beam
        inst.apply_vane_voltages(6.0, 4.0);
        assert!((inst.wind_angle().mean() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_delta_has_every_path() {
        let mut source = ManualEdgeSource::new();
        let mut inst = instruments(&mut source);
        inst.apply_orientation(&OrientationSample {
            fusion_pose: Vector3::new(0.123456, 0.0, FRAC_PI_2),
            gyro: Vector3::default(),
        });
        for _ in 0..5 {
            source.fire(7, 10_000_000);
        }
        inst.run_calculation();
        let delta = inst.delta();
        let published: Vec<&str> = delta.values().map(|v| v.path).collect();
        assert_eq!(published, paths::ALL.to_vec());
        assert_eq!(delta.value(paths::WATER_PULSES), Some(Value::Count(5)));
        assert_eq!(delta.value(paths::ROLL), Some(Value::Number(0.1235)));
        assert_eq!(delta.context, "vessels.self");
    }
}
