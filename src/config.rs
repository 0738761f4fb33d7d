//! Configuration for the sensor core.
//!
//! Every section has defaults, so a TOML file only needs the values that
//! differ from a stock installation:
//!
//! ```toml
//! vessel_id = "urn:mrn:imo:mmsi:235000000"
//!
//! [boat]
//! mast_height = 17.5
//!
//! [water_sensor]
//! pin = 7
//! filter = { kind = "moving_average", window = 8 }
//! calibration = [{ frequency = 1.0e9, scale = 0.0935 }]
//! ```
//!
//! Speeds are m/s and angles radians throughout.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SensorError};
use crate::pulse::{CalibrationPoint, CalibrationTable};
use crate::wind::{HeelCorrectionEntry, HeelCorrectionTable};

/// Top of the calibration range for the stock linear sensors
const LINEAR_CALIBRATION_LIMIT_HZ: f64 = 1.0e9;

/// Boat constants used by the correction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatConfig {
    /// Leeway coefficient: leeway = k_factor × roll / stw²
    pub k_factor: f64,
    /// Upwash coefficient in degrees
    pub upwash_k: f64,
    /// Masthead sensor height above the roll and pitch axes, metres
    pub mast_height: f64,
    /// Compass deviation, radians
    pub deviation: f64,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            k_factor: 9.0,
            upwash_k: 9.0,
            mast_height: 19.0,
            deviation: 0.0,
        }
    }
}

/// Periods of the four scheduler tasks, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodConfig {
    /// IMU poll
    pub motion_ms: u64,
    /// Wind vane ADC read
    pub wind_ms: u64,
    /// Correction pipeline
    pub calculation_ms: u64,
    /// Delta publication
    pub output_ms: u64,
}

impl PeriodConfig {
    pub fn motion(&self) -> Duration {
        Duration::from_millis(self.motion_ms)
    }

    pub fn wind(&self) -> Duration {
        Duration::from_millis(self.wind_ms)
    }

    pub fn calculation(&self) -> Duration {
        Duration::from_millis(self.calculation_ms)
    }

    pub fn output(&self) -> Duration {
        Duration::from_millis(self.output_ms)
    }
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            motion_ms: 100,
            wind_ms: 100,
            calculation_ms: 200,
            output_ms: 500,
        }
    }
}

/// Window lengths of the running statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub pose_window: usize,
    pub rate_window: usize,
    pub wind_angle_window: usize,
    pub vane_voltage_window: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            pose_window: 10,
            rate_window: 10,
            wind_angle_window: 10,
            vane_voltage_window: 10,
        }
    }
}

/// Filtering strategy of a pulse meter
///
/// # Parsing formats
/// - `iir:3` - IIR filter with weight 3 (average moves 1/8 per edge)
/// - `average:8` - moving average over 8 edges with outlier rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PulseFilter {
    Iir { weight: u32 },
    MovingAverage { window: usize },
}

impl Default for PulseFilter {
    fn default() -> Self {
        Self::Iir { weight: 3 }
    }
}

impl fmt::Display for PulseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iir { weight } => write!(f, "iir:{}", weight),
            Self::MovingAverage { window } => write!(f, "average:{}", window),
        }
    }
}

impl FromStr for PulseFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid filter '{}': expected kind:value", s))?;
        let value = value.trim();
        match kind.trim().to_ascii_lowercase().as_str() {
            "iir" => value
                .parse()
                .map(|weight| Self::Iir { weight })
                .map_err(|_| format!("Invalid IIR weight '{}'", value)),
            "average" | "moving_average" => value
                .parse()
                .map(|window| Self::MovingAverage { window })
                .map_err(|_| format!("Invalid window '{}'", value)),
            other => Err(format!("Unknown filter kind '{}'", other)),
        }
    }
}

/// One pulse sensor: edge pin, filter and calibration
///
/// Fields missing from a `[wind_sensor]` or `[water_sensor]` section come
/// from that sensor's stock settings, [`PulseSensorConfig::wind`] and
/// [`PulseSensorConfig::water`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseSensorConfig {
    pub pin: u8,
    #[serde(default)]
    pub filter: PulseFilter,
    pub calibration: Vec<CalibrationPoint>,
}

impl PulseSensorConfig {
    /// Linear sensor rated at `hz_per_kn`
    pub fn linear(pin: u8, hz_per_kn: f64) -> Self {
        Self {
            pin,
            filter: PulseFilter::default(),
            calibration: vec![CalibrationPoint::from_hz_per_knot(
                LINEAR_CALIBRATION_LIMIT_HZ,
                hz_per_kn,
            )],
        }
    }

    /// Masthead cup anemometer, 1.045 Hz/kn
    pub fn wind() -> Self {
        Self::linear(6, 1.045)
    }

    /// Paddle wheel, 5.5 Hz/kn
    pub fn water() -> Self {
        Self::linear(7, 5.5)
    }
}

/// A pulse sensor section as written, before backfilling
#[derive(Deserialize)]
struct PulseSensorSection {
    pin: Option<u8>,
    filter: Option<PulseFilter>,
    calibration: Option<Vec<CalibrationPoint>>,
}

impl PulseSensorSection {
    fn or(self, stock: PulseSensorConfig) -> PulseSensorConfig {
        PulseSensorConfig {
            pin: self.pin.unwrap_or(stock.pin),
            filter: self.filter.unwrap_or(stock.filter),
            calibration: self.calibration.unwrap_or(stock.calibration),
        }
    }
}

fn wind_sensor_section<'de, D>(deserializer: D) -> std::result::Result<PulseSensorConfig, D::Error>
where
    D: Deserializer<'de>,
{
    PulseSensorSection::deserialize(deserializer).map(|s| s.or(PulseSensorConfig::wind()))
}

fn water_sensor_section<'de, D>(deserializer: D) -> std::result::Result<PulseSensorConfig, D::Error>
where
    D: Deserializer<'de>,
{
    PulseSensorSection::deserialize(deserializer).map(|s| s.or(PulseSensorConfig::water()))
}

/// Voltage range of one vane potentiometer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoltageSpan {
    pub min: f64,
    pub max: f64,
}

impl VoltageSpan {
    /// Map a voltage onto [-1, 1], clamping outside the span
    pub fn normalize(&self, volts: f64) -> f64 {
        let ratio = ((volts - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        2.0 * ratio - 1.0
    }
}

impl Default for VoltageSpan {
    fn default() -> Self {
        Self { min: 2.0, max: 6.0 }
    }
}

/// Sine/cosine wind vane wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindVaneConfig {
    pub sin_channel: u8,
    pub cos_channel: u8,
    pub sin: VoltageSpan,
    pub cos: VoltageSpan,
}

impl Default for WindVaneConfig {
    fn default() -> Self {
        Self {
            sin_channel: 0,
            cos_channel: 1,
            sin: VoltageSpan::default(),
            cos: VoltageSpan::default(),
        }
    }
}

/// Analog converter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    pub bus: String,
    pub address: u16,
    /// Full-scale range in millivolts
    pub gain: u16,
    /// Samples per second
    pub sample_rate: u16,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            bus: "/dev/i2c-1".to_string(),
            address: 0x48,
            gain: 4096,
            sample_rate: 250,
        }
    }
}

/// Complete configuration of the sensor core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub vessel_id: String,
    pub boat: BoatConfig,
    pub periods: PeriodConfig,
    pub statistics: StatisticsConfig,
    #[serde(deserialize_with = "wind_sensor_section")]
    pub wind_sensor: PulseSensorConfig,
    #[serde(deserialize_with = "water_sensor_section")]
    pub water_sensor: PulseSensorConfig,
    pub wind_vane: WindVaneConfig,
    pub adc: AdcConfig,
    /// Paddle-wheel corrections, largest heel first
    pub water_speed_heel_corrections: Vec<HeelCorrectionEntry>,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            vessel_id: "self".to_string(),
            boat: BoatConfig::default(),
            periods: PeriodConfig::default(),
            statistics: StatisticsConfig::default(),
            wind_sensor: PulseSensorConfig::wind(),
            water_sensor: PulseSensorConfig::water(),
            wind_vane: WindVaneConfig::default(),
            adc: AdcConfig::default(),
            water_speed_heel_corrections: vec![HeelCorrectionEntry::new(0.0, 1.0)],
        }
    }
}

impl SensorsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| SensorError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SensorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Context of published deltas
    pub fn context(&self) -> String {
        format!("vessels.{}", self.vessel_id)
    }

    pub fn heel_correction_table(&self) -> Result<HeelCorrectionTable> {
        HeelCorrectionTable::new(self.water_speed_heel_corrections.clone())
    }

    /// Reject configurations the core cannot run with
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("motion", self.periods.motion_ms),
            ("wind", self.periods.wind_ms),
            ("calculation", self.periods.calculation_ms),
            ("output", self.periods.output_ms),
        ];
        for (name, ms) in periods {
            if ms == 0 {
                return Err(SensorError::Config(format!(
                    "{} period must be positive",
                    name
                )));
            }
        }

        let windows = [
            ("pose", self.statistics.pose_window),
            ("rate", self.statistics.rate_window),
            ("wind angle", self.statistics.wind_angle_window),
            ("vane voltage", self.statistics.vane_voltage_window),
        ];
        for (name, window) in windows {
            if window == 0 {
                return Err(SensorError::Config(format!(
                    "{} window must be positive",
                    name
                )));
            }
        }

        for (name, sensor) in [("wind", &self.wind_sensor), ("water", &self.water_sensor)] {
            CalibrationTable::new(sensor.calibration.clone())?;
            if let PulseFilter::MovingAverage { window: 0 } = sensor.filter {
                return Err(SensorError::Config(format!(
                    "{} sensor moving average window must be positive",
                    name
                )));
            }
        }
        if self.wind_sensor.pin == self.water_sensor.pin {
            return Err(SensorError::Config(format!(
                "wind and water sensors share pin {}",
                self.wind_sensor.pin
            )));
        }

        if self.wind_vane.sin_channel == self.wind_vane.cos_channel {
            return Err(SensorError::Config(format!(
                "vane sine and cosine share ADC channel {}",
                self.wind_vane.sin_channel
            )));
        }
        for (name, span) in [("sine", self.wind_vane.sin), ("cosine", self.wind_vane.cos)] {
            if !(span.min.is_finite() && span.max.is_finite() && span.max > span.min) {
                return Err(SensorError::Config(format!(
                    "vane {} span {}..{} is empty",
                    name, span.min, span.max
                )));
            }
        }

        let boat = &self.boat;
        if ![boat.k_factor, boat.upwash_k, boat.mast_height, boat.deviation]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(SensorError::Config("boat constants must be finite".into()));
        }
        if boat.mast_height < 0.0 {
            return Err(SensorError::Config(format!(
                "mast height {} is negative",
                boat.mast_height
            )));
        }

        if self.adc.gain == 0 || self.adc.sample_rate == 0 {
            return Err(SensorError::Config(
                "ADC gain and sample rate must be positive".into(),
            ));
        }

        self.heel_correction_table()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SensorsConfig::default();
        config.validate().unwrap();
        assert_eq!(config.wind_sensor.pin, 6);
        assert_eq!(config.water_sensor.pin, 7);
        assert_eq!(config.periods.calculation(), Duration::from_millis(200));
        assert_eq!(config.context(), "vessels.self");
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = SensorsConfig::from_toml_str("").unwrap();
        assert_eq!(config, SensorsConfig::default());
    }

    #[test]
    fn test_partial_sections_backfill() {
        let config = SensorsConfig::from_toml_str(
            r#"
            vessel_id = "urn:mrn:imo:mmsi:235000000"

            [boat]
            mast_height = 17.5

            [periods]
            output_ms = 1000

            [water_sensor]
            pin = 17
            filter = { kind = "moving_average", window = 8 }
            calibration = [
                { frequency = 2.0, scale = 0.1 },
                { frequency = 1.0e9, scale = 0.09 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.boat.mast_height, 17.5);
        assert_eq!(config.boat.k_factor, 9.0);
        assert_eq!(config.periods.output_ms, 1000);
        assert_eq!(config.periods.motion_ms, 100);
        assert_eq!(config.water_sensor.pin, 17);
        assert_eq!(
            config.water_sensor.filter,
            PulseFilter::MovingAverage { window: 8 }
        );
        assert_eq!(config.water_sensor.calibration.len(), 2);
        assert_eq!(config.wind_sensor, PulseSensorConfig::wind());
        assert_eq!(config.context(), "vessels.urn:mrn:imo:mmsi:235000000");
    }

    #[test]
    fn test_sensor_section_backfills_stock_values() {
        let config = SensorsConfig::from_toml_str("[water_sensor]\npin = 17\n").unwrap();
        assert_eq!(config.water_sensor.pin, 17);
        assert_eq!(config.water_sensor.filter, PulseFilter::default());
        assert_eq!(
            config.water_sensor.calibration,
            PulseSensorConfig::water().calibration
        );

        let config = SensorsConfig::from_toml_str(
            r#"
            [wind_sensor]
            filter = { kind = "moving_average", window = 4 }
            "#,
        )
        .unwrap();
        assert_eq!(config.wind_sensor.pin, 6);
        assert_eq!(
            config.wind_sensor.filter,
            PulseFilter::MovingAverage { window: 4 }
        );
        assert_eq!(
            config.wind_sensor.calibration,
            PulseSensorConfig::wind().calibration
        );
    }

    #[test]
    fn test_vane_span_backfills_missing_bound() {
        let config = SensorsConfig::from_toml_str("[wind_vane.sin]\nmin = 1.5\n").unwrap();
        assert_eq!(config.wind_vane.sin, VoltageSpan { min: 1.5, max: 6.0 });
        assert_eq!(config.wind_vane.cos, VoltageSpan::default());
    }

    #[test]
    fn test_rejects_unsorted_calibration() {
        let result = SensorsConfig::from_toml_str(
            r#"
            [wind_sensor]
            pin = 6
            calibration = [
                { frequency = 5.0, scale = 0.4 },
                { frequency = 2.0, scale = 0.5 },
            ]
            "#,
        );
        assert!(matches!(result, Err(SensorError::Calibration(_))));
    }

    #[test]
    fn test_rejects_zero_period() {
        let mut config = SensorsConfig::default();
        config.periods.wind_ms = 0;
        assert!(matches!(config.validate(), Err(SensorError::Config(_))));
    }

    #[test]
    fn test_rejects_ascending_heel_corrections() {
        let mut config = SensorsConfig::default();
        config.water_speed_heel_corrections = vec![
            HeelCorrectionEntry::new(0.05, 0.95),
            HeelCorrectionEntry::new(0.1, 0.9),
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_shared_pin() {
        let mut config = SensorsConfig::default();
        config.water_sensor.pin = config.wind_sensor.pin;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pulse_filter_parse() {
        assert_eq!(
            "iir:4".parse::<PulseFilter>().unwrap(),
            PulseFilter::Iir { weight: 4 }
        );
        assert_eq!(
            "average:8".parse::<PulseFilter>().unwrap(),
            PulseFilter::MovingAverage { window: 8 }
        );
        assert!("iir".parse::<PulseFilter>().is_err());
        assert!("median:3".parse::<PulseFilter>().is_err());
        assert_eq!(PulseFilter::Iir { weight: 3 }.to_string(), "iir:3");
    }

    #[test]
    fn test_vane_span_normalize() {
        let span = VoltageSpan::default();
        assert_eq!(span.normalize(2.0), -1.0);
        assert_eq!(span.normalize(4.0), 0.0);
        assert_eq!(span.normalize(6.0), 1.0);
        assert_eq!(span.normalize(7.5), 1.0);
        assert_eq!(span.normalize(0.0), -1.0);
    }
}
