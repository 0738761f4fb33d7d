use crossbeam_channel::Sender;
use std::io::Write;

use super::{Delta, Formatter};

/// Receiver of published deltas
///
/// Publication is fire-and-forget: a sink that cannot deliver logs and
/// drops the delta.
pub trait MessageSink: Send {
    fn publish(&mut self, delta: &Delta);
}

/// Writes formatted deltas, one per line
pub struct WriterSink<W: Write + Send> {
    writer: W,
    formatter: Box<dyn Formatter>,
    header_pending: bool,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, formatter: Box<dyn Formatter>) -> Self {
        let header_pending = formatter.header().is_some();
        Self {
            writer,
            formatter,
            header_pending,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, delta: &Delta) -> std::io::Result<()> {
        if self.header_pending {
            if let Some(header) = self.formatter.header() {
                writeln!(self.writer, "{}", header)?;
            }
            self.header_pending = false;
        }
        writeln!(self.writer, "{}", self.formatter.format(delta))?;
        self.writer.flush()
    }
}

impl<W: Write + Send> MessageSink for WriterSink<W> {
    fn publish(&mut self, delta: &Delta) {
        if let Err(e) = self.write_line(delta) {
            log::warn!("Failed to write delta: {}", e);
        }
    }
}

/// Forwards deltas to another thread
pub struct ChannelSink {
    tx: Sender<Delta>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Delta>) -> Self {
        Self { tx }
    }
}

impl MessageSink for ChannelSink {
    fn publish(&mut self, delta: &Delta) {
        if self.tx.try_send(delta.clone()).is_err() {
            log::trace!("Delta dropped, receiver full or gone");
        }
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F>(pub F);

impl<F: FnMut(&Delta) + Send> MessageSink for FnSink<F> {
    fn publish(&mut self, delta: &Delta) {
        (self.0)(delta)
    }
}
