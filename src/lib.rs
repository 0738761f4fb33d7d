pub mod config;
pub mod constants;
pub mod error;
pub mod hardware;
pub mod instruments;
pub mod orientation;
pub mod output;
pub mod pulse;
pub mod scheduler;
pub mod stats;
pub mod units;
pub mod wind;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::SensorsConfig;
pub use error::{Result, SensorError};
pub use hardware::Hardware;
pub use instruments::Instruments;
pub use scheduler::Sensors;
