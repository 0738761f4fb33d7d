use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError, bounded};

use crate::error::{Result, SensorError};

/// One thread per physical device, servicing one request at a time
///
/// Requests are issued with [`DeviceWorker::request`]; the reply for each is
/// sent on the channel given at spawn time. While a request is in flight
/// further requests are refused, so a slow device lowers the effective poll
/// rate instead of queueing work.
pub struct DeviceWorker<Req: Send + 'static> {
    name: String,
    request_tx: Option<Sender<Req>>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<Req: Send + 'static> DeviceWorker<Req> {
    pub fn spawn<D, Resp, F>(
        name: &str,
        mut device: D,
        reply_tx: Sender<Resp>,
        mut service: F,
    ) -> Result<Self>
    where
        D: Send + 'static,
        Resp: Send + 'static,
        F: FnMut(&mut D, Req) -> Resp + Send + 'static,
    {
        let (request_tx, request_rx) = bounded::<Req>(1);
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = Arc::clone(&busy);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for request in request_rx.iter() {
                    let reply = service(&mut device, request);
                    worker_busy.store(false, Ordering::Release);
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| SensorError::Device(format!("failed to spawn {}: {}", name, e)))?;

        Ok(Self {
            name: name.to_string(),
            request_tx: Some(request_tx),
            busy,
            handle: Some(handle),
        })
    }

    /// Issue a request unless one is already in flight
    ///
    /// Returns false when the request was not issued.
    pub fn request(&self, request: Req) -> bool {
        let Some(tx) = self.request_tx.as_ref() else {
            return false;
        };
        if self.busy.swap(true, Ordering::AcqRel) {
            return false;
        }
        match tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.busy.store(false, Ordering::Release);
                false
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Stop accepting requests and wait for the in-flight one to finish
    pub fn shutdown(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("{} worker panicked", self.name);
            }
        }
    }
}

impl<Req: Send + 'static> Drop for DeviceWorker<Req> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
