//! Attitude and rate tracking from IMU polls.

pub mod pose;
pub mod rate_gyro;

pub use pose::{Pose, yaw_to_heading};
pub use rate_gyro::RateGyro;
