use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calibration table error: {0}")]
    Calibration(String),

    #[error("Edge source error on pin {pin}: {reason}")]
    EdgeSource { pin: u8, reason: String },

    #[error("Analog read failed on channel {channel}: {reason}")]
    AnalogRead { channel: u8, reason: String },

    #[error("Orientation source error: {0}")]
    Orientation(String),

    #[error("Device worker error: {0}")]
    Device(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

pub type Result<T> = std::result::Result<T, SensorError>;
