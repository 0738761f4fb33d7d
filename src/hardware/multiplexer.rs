use thiserror::Error;

use super::AnalogConverter;
use crate::error::SensorError;

/// A multiplexed read that stopped at a failing channel
///
/// The voltages of the channels read before the failure are kept in request
/// order and exposed through [`ChannelReadError::partial`].
#[derive(Error, Debug)]
#[error("analog read stopped at channel {channel}: {source}")]
pub struct ChannelReadError<const N: usize> {
    pub channel: u8,
    voltages: [f64; N],
    read: usize,
    pub source: SensorError,
}

impl<const N: usize> ChannelReadError<N> {
    /// Voltages collected before the failing channel
    pub fn partial(&self) -> &[f64] {
        &self.voltages[..self.read]
    }
}

/// Sequential multi-channel acquisition on a single converter
///
/// The converter supports one conversion in flight, so channels are read
/// strictly one after another and the next conversion is only issued once the
/// previous one has completed.
pub struct AnalogMultiplexer {
    adc: Box<dyn AnalogConverter>,
    gain: u16,
    sample_rate: u16,
}

impl AnalogMultiplexer {
    pub fn new(adc: Box<dyn AnalogConverter>, gain: u16, sample_rate: u16) -> Self {
        Self {
            adc,
            gain,
            sample_rate,
        }
    }

    /// Read `channels` in order
    ///
    /// # Arguments
    /// * `channels` - ADC inputs to convert, in the order they are issued
    ///
    /// # Returns
    /// One voltage per channel in request order. The first failure ends the
    /// sweep; channels after it are not read. The sweep never allocates.
    pub fn read_channels<const N: usize>(
        &mut self,
        channels: [u8; N],
    ) -> Result<[f64; N], ChannelReadError<N>> {
        let mut voltages = [0.0; N];
        for (read, (&channel, slot)) in channels.iter().zip(voltages.iter_mut()).enumerate() {
            match self.adc.read_channel(channel, self.gain, self.sample_rate) {
                Ok(volts) => *slot = volts,
                Err(source) => {
                    return Err(ChannelReadError {
                        channel,
                        voltages,
                        read,
                        source,
                    });
                }
            }
        }
        Ok(voltages)
    }
}
