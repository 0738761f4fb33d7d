//! Hardware capabilities consumed by the sensor core.
//!
//! Each physical concern is a trait so that concrete bindings are chosen by
//! the host when composing [`Hardware`], never probed at runtime:
//!
//! - [`DigitalEdgeSource`]: pulse interrupts from the paddle wheel and wind cups
//! - [`AnalogConverter`]: the multiplexed ADC behind the wind vane
//! - [`OrientationSource`]: the fused IMU pose and gyro rates
//!
//! [`mock`] carries manually driven implementations for tests and hosts;
//! simulated ones live in `crate::simulation` behind the `simulation` feature.

pub mod mock;
pub mod multiplexer;
pub mod worker;

pub use multiplexer::{AnalogMultiplexer, ChannelReadError};
pub use worker::DeviceWorker;

use crate::error::Result;

/// Called from the edge context with the nanoseconds since the previous edge.
///
/// Implementations must stay O(1) and must not block or allocate.
pub type EdgeCallback = Box<dyn FnMut(u64) + Send + 'static>;

/// Which signal transition raises an edge event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    Rising,
    Falling,
    Both,
}

/// Input pull resistor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullConfig {
    Off,
    Down,
    Up,
}

/// Handle to a live edge registration
pub trait EdgeRegistration: Send {
    /// Stop delivering edges. Calling it again has no effect.
    fn cancel(&mut self);
}

pub trait DigitalEdgeSource: Send {
    fn register(
        &mut self,
        pin: u8,
        mode: EdgeMode,
        pull: PullConfig,
        on_edge: EdgeCallback,
    ) -> Result<Box<dyn EdgeRegistration>>;
}

pub trait AnalogConverter: Send {
    /// Single-ended conversion of `channel`, returning volts
    ///
    /// `gain` is the programmable full-scale range in millivolts and
    /// `sample_rate` the conversion rate in samples per second.
    fn read_channel(&mut self, channel: u8, gain: u16, sample_rate: u16) -> Result<f64>;
}

pub trait OrientationSource: Send {
    fn poll(&mut self) -> Result<OrientationSample>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One IMU poll
///
/// `fusion_pose` holds roll (x), pitch (y) and yaw (z) in radians, `gyro`
/// the matching rates in rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationSample {
    pub fusion_pose: Vector3,
    pub gyro: Vector3,
}

/// The set of device handles injected into the sensor core
pub struct Hardware {
    pub edges: Box<dyn DigitalEdgeSource>,
    pub adc: Box<dyn AnalogConverter>,
    pub orientation: Box<dyn OrientationSource>,
}

impl Hardware {
    pub fn new(
        edges: impl DigitalEdgeSource + 'static,
        adc: impl AnalogConverter + 'static,
        orientation: impl OrientationSource + 'static,
    ) -> Self {
        Self {
            edges: Box::new(edges),
            adc: Box::new(adc),
            orientation: Box::new(orientation),
        }
    }
}
