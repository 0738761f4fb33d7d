//! Published records and the sinks that carry them.

mod csv;
mod json;
mod sink;
mod text;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::sink::{ChannelSink, FnSink, MessageSink, WriterSink};
pub use self::text::TextFormatter;

/// Source tag carried by every delta
pub const SOURCE_LABEL: &str = "multi_sensor";

/// Published paths, in publication order
pub mod paths {
    pub const TIMESTAMP: &str = "sensors.timestamp";
    pub const WIND_PULSES: &str = "sensors.wind.pulses";
    pub const WATER_PULSES: &str = "sensors.water.pulses";
    pub const VANE_SIN_VOLTS: &str = "sensors.wind.sinV";
    pub const VANE_COS_VOLTS: &str = "sensors.wind.cosV";
    pub const HEADING: &str = "navigation.headingMagnetic";
    pub const RATE_OF_TURN: &str = "navigation.rateOfTurn";
    pub const ROLL: &str = "navigation.attitude.roll";
    pub const PITCH: &str = "navigation.attitude.pitch";
    pub const YAW: &str = "navigation.attitude.yaw";
    pub const APPARENT_WIND_SPEED: &str = "environment.wind.speedApparent";
    pub const APPARENT_WIND_ANGLE: &str = "environment.wind.angleApparent";
    pub const TRUE_WIND_SPEED: &str = "environment.wind.speedTrue";
    pub const TRUE_WIND_ANGLE: &str = "environment.wind.angleTrueWater";
    pub const LEEWAY: &str = "navigation.leewayAngle";
    pub const WATER_SPEED: &str = "navigation.speedThroughWater";
    pub const LOG: &str = "navigation.log";

    pub const ALL: [&str; 17] = [
        TIMESTAMP,
        WIND_PULSES,
        WATER_PULSES,
        VANE_SIN_VOLTS,
        VANE_COS_VOLTS,
        HEADING,
        RATE_OF_TURN,
        ROLL,
        PITCH,
        YAW,
        APPARENT_WIND_SPEED,
        APPARENT_WIND_ANGLE,
        TRUE_WIND_SPEED,
        TRUE_WIND_ANGLE,
        LEEWAY,
        WATER_SPEED,
        LOG,
    ];
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// A published value: counters stay integral, measurements are reals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Count(u64),
    Number(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Count(n) => n as f64,
            Self::Number(v) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Number(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub src: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub source: Source,
    pub timestamp: String,
    pub values: Vec<PathValue>,
}

/// One Signal K style delta message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub context: String,
    pub updates: Vec<Update>,
}

impl Delta {
    /// Single-update delta tagged with [`SOURCE_LABEL`]
    pub fn new(context: String, timestamp: DateTime<Utc>, values: Vec<PathValue>) -> Self {
        Self {
            context,
            updates: vec![Update {
                source: Source { src: SOURCE_LABEL },
                timestamp: format_timestamp(&timestamp),
                values,
            }],
        }
    }

    pub fn timestamp(&self) -> &str {
        self.updates.first().map_or("", |u| u.timestamp.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &PathValue> {
        self.updates.iter().flat_map(|u| u.values.iter())
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        self.values().find(|v| v.path == path).map(|v| v.value)
    }
}

pub trait Formatter: Send {
    fn format(&self, delta: &Delta) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
