//! Periodic task scheduling for the sensor core.
//!
//! One scheduler thread owns the [`Instruments`] aggregate and multiplexes
//! four periodic tasks with `select!`:
//! - motion: poll the IMU
//! - wind: read the vane channels through the ADC multiplexer
//! - calculation: run the correction pipeline
//! - output: publish a delta
//!
//! Device reads run on one worker thread per device and report back over
//! reply channels, so a slow IMU never delays an ADC read. A device with a
//! request still in flight is skipped until it answers.

use crossbeam_channel::{Receiver, Sender, bounded, never, select, tick};
use std::thread::{self, JoinHandle};

use crate::config::{PeriodConfig, SensorsConfig};
use crate::error::{Result, SensorError};
use crate::hardware::multiplexer::{AnalogMultiplexer, ChannelReadError};
use crate::hardware::worker::DeviceWorker;
use crate::hardware::{DigitalEdgeSource, Hardware, OrientationSample, OrientationSource};
use crate::instruments::Instruments;
use crate::output::MessageSink;

type OrientationReply = Result<OrientationSample>;
type VaneReply = std::result::Result<[f64; 2], ChannelReadError<2>>;

/// Running sensor core
///
/// Dropping it has the same effect as [`Sensors::close`].
pub struct Sensors {
    stop_tx: Option<Sender<()>>,
    scheduler: Option<JoinHandle<Instruments>>,
    edges: Option<Box<dyn DigitalEdgeSource>>,
}

impl Sensors {
    /// Start the sensor core
    ///
    /// # Arguments
    /// * `sink` - Receives one delta per output period
    /// * `config` - Validated before any device is touched
    /// * `hardware` - Edge source, ADC and IMU the tasks drive
    ///
    /// # Returns
    /// A running core, or the configuration, registration or thread spawn
    /// error that stopped it. Edges registered before a failure are released.
    pub fn start(
        sink: impl MessageSink + 'static,
        config: SensorsConfig,
        hardware: Hardware,
    ) -> Result<Self> {
        config.validate()?;
        let Hardware {
            mut edges,
            adc,
            orientation,
        } = hardware;

        let instruments = Instruments::new(&config, edges.as_mut())?;

        // one request in flight per worker, so one reply slot suffices
        let (imu_tx, imu_rx) = bounded(1);
        let imu = DeviceWorker::spawn(
            "imu",
            orientation,
            imu_tx,
            |device: &mut Box<dyn OrientationSource>, ()| device.poll(),
        )?;

        let (adc_tx, adc_rx) = bounded(1);
        let multiplexer = AnalogMultiplexer::new(adc, config.adc.gain, config.adc.sample_rate);
        let adc = DeviceWorker::spawn(
            "adc",
            multiplexer,
            adc_tx,
            |mux: &mut AnalogMultiplexer, channels: [u8; 2]| mux.read_channels(channels),
        )?;

        let (stop_tx, stop_rx) = bounded(1);
        let scheduler = Scheduler {
            instruments,
            sink: Box::new(sink),
            imu,
            adc,
            imu_rx,
            adc_rx,
            periods: config.periods.clone(),
        };
        let handle = thread::Builder::new()
            .name("sensor-scheduler".to_string())
            .spawn(move || scheduler.run(stop_rx))
            .map_err(|e| SensorError::Scheduler(format!("failed to spawn scheduler: {}", e)))?;

        log::info!(
            "Sensors started for {} (motion {} ms, wind {} ms, calculation {} ms, output {} ms)",
            config.context(),
            config.periods.motion_ms,
            config.periods.wind_ms,
            config.periods.calculation_ms,
            config.periods.output_ms
        );

        Ok(Self {
            stop_tx: Some(stop_tx),
            scheduler: Some(handle),
            edges: Some(edges),
        })
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Stop the periodic tasks, then release both edge registrations
    ///
    /// Calling it again does nothing.
    pub fn close(&mut self) {
        let Some(handle) = self.scheduler.take() else {
            return;
        };
        // dropping the sender wakes the scheduler's select
        self.stop_tx.take();
        match handle.join() {
            Ok(mut instruments) => instruments.close(),
            Err(_) => log::error!("Sensor scheduler panicked"),
        }
        self.edges.take();
        log::info!("Sensors closed");
    }
}

impl Drop for Sensors {
    fn drop(&mut self) {
        self.close();
    }
}

struct Scheduler {
    instruments: Instruments,
    sink: Box<dyn MessageSink>,
    imu: DeviceWorker<()>,
    adc: DeviceWorker<[u8; 2]>,
    imu_rx: Receiver<OrientationReply>,
    adc_rx: Receiver<VaneReply>,
    periods: PeriodConfig,
}

impl Scheduler {
    fn run(self, stop_rx: Receiver<()>) -> Instruments {
        let Scheduler {
            mut instruments,
            mut sink,
            mut imu,
            mut adc,
            imu_rx,
            adc_rx,
            periods,
        } = self;

        let motion = tick(periods.motion());
        let wind = tick(periods.wind());
        let calculation = tick(periods.calculation());
        let output = tick(periods.output());
        let stopped_imu = never::<OrientationReply>();
        let stopped_adc = never::<VaneReply>();
        let mut imu_alive = true;
        let mut adc_alive = true;

        loop {
            // a dead worker's channel is always ready, so swap in one that never is
            let imu_replies = if imu_alive { &imu_rx } else { &stopped_imu };
            let adc_replies = if adc_alive { &adc_rx } else { &stopped_adc };

            select! {
                recv(stop_rx) -> _ => break,
                recv(motion) -> _ => {
                    if !imu.request(()) {
                        log::trace!("IMU poll still in flight, skipping");
                    }
                }
                recv(wind) -> _ => {
                    if !adc.request(instruments.vane_channels()) {
                        log::trace!("Vane read still in flight, skipping");
                    }
                }
                recv(calculation) -> _ => {
                    instruments.run_calculation();
                }
                recv(output) -> _ => {
                    sink.publish(&instruments.delta());
                }
                recv(imu_replies) -> reply => match reply {
                    Ok(Ok(sample)) => instruments.apply_orientation(&sample),
                    Ok(Err(e)) => log::warn!("IMU poll failed, keeping last pose: {}", e),
                    Err(_) => {
                        log::error!("IMU worker stopped");
                        imu_alive = false;
                    }
                },
                recv(adc_replies) -> reply => match reply {
                    Ok(Ok([sin_volts, cos_volts])) => {
                        instruments.apply_vane_voltages(sin_volts, cos_volts)
                    }
                    Ok(Err(e)) => log::warn!(
                        "Vane read failed after {} channel(s): {}",
                        e.partial().len(),
                        e
                    ),
                    Err(_) => {
                        log::error!("ADC worker stopped");
                        adc_alive = false;
                    }
                },
            }
        }

        // a worker blocked on a full reply slot wakes once its receiver is gone
        drop(imu_rx);
        drop(adc_rx);
        imu.shutdown();
        adc.shutdown();
        log::debug!("Sensor scheduler stopped");
        instruments
    }
}
