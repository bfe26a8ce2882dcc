use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pipeline::{RadarPipeline, RadarSnapshot};
use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::SweepLoop;
use crate::protocol::{Command, RawChunk};
use crate::telemetry::log::LogManager;
use crate::transport::{Subscription, Transport};

/// Connection lifecycle around a [`RadarPipeline`].
///
/// The transport listener only enqueues chunks; a single consumer task
/// drains the queue and runs each chunk through the pipeline before
/// taking the next, so arrival order is preserved. Display readers go
/// through [`RadarSession::snapshot`].
///
/// Each connection carries a closed flag that is only read or written
/// under the pipeline write lock. Once `disconnect` has set it and reset
/// the pipeline, chunks still queued for that connection are discarded.
pub struct RadarSession {
    pipeline: Arc<RwLock<RadarPipeline>>,
    transport: Option<Arc<dyn Transport>>,
    closed: Option<Arc<AtomicBool>>,
    subscription: Option<Subscription>,
    consumer: Option<JoinHandle<()>>,
    sweep: Option<SweepLoop>,
    logger: LogManager,
}

impl RadarSession {
    pub fn new(pipeline: RadarPipeline) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(pipeline)),
            transport: None,
            closed: None,
            subscription: None,
            consumer: None,
            sweep: None,
            logger: LogManager::new("session"),
        }
    }

    pub fn pipeline(&self) -> Arc<RwLock<RadarPipeline>> {
        self.pipeline.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Subscribes to `transport` and starts the consumer and sweep tasks.
    /// Must be called from within a tokio runtime. An existing connection
    /// is torn down first.
    pub fn connect(&mut self, transport: Arc<dyn Transport>) {
        self.disconnect();

        let (tx, mut rx) = mpsc::unbounded_channel::<RawChunk>();
        let subscription = transport.subscribe(Box::new(move |chunk| {
            // The receiver only goes away on disconnect.
            let _ = tx.send(chunk);
        }));

        let closed = Arc::new(AtomicBool::new(false));
        let consumer_closed = closed.clone();
        let pipeline = self.pipeline.clone();
        let consumer = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                let mut guard = pipeline.write().unwrap_or_else(PoisonError::into_inner);
                if consumer_closed.load(Ordering::Acquire) {
                    break;
                }
                guard.ingest(&chunk);
            }
        });

        let sweep_config = {
            let mut guard = self.write();
            guard.set_transport_connected(true);
            guard.config().sweep.clone()
        };
        let reader = self.pipeline.clone();
        let sweep = SweepLoop::start(&sweep_config, move || {
            reader
                .read()
                .map(|guard| guard.telemetry().angle)
                .unwrap_or_default()
        });

        self.transport = Some(transport);
        self.closed = Some(closed);
        self.subscription = Some(subscription);
        self.consumer = Some(consumer);
        self.sweep = Some(sweep);
        self.logger.record("connected");
    }

    /// Unsubscribes, stops both tasks and resets the pipeline's connection
    /// state. Returns false when there was nothing to tear down.
    pub fn disconnect(&mut self) -> bool {
        let was_connected = self.transport.take().is_some();

        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(consumer) = self.consumer.take() {
            consumer.abort();
        }
        if let Some(mut sweep) = self.sweep.take() {
            sweep.stop();
        }

        let closed = self.closed.take();
        if was_connected {
            let mut guard = self.write();
            if let Some(closed) = closed {
                closed.store(true, Ordering::Release);
            }
            guard.reset();
            drop(guard);
            self.logger.record("disconnected");
        }
        was_connected
    }

    /// Sends `command` as a newline-terminated frame, once.
    pub fn send_command(&self, command: &Command) -> PipelineResult<()> {
        let transport = self.transport.as_ref().ok_or(PipelineError::NotConnected)?;
        let frame = command.to_frame();
        transport.send(&frame).map_err(|err| {
            self.read().record_transport_failure();
            self.logger
                .irregularity(&format!("sending {:?} failed: {}", command.to_string(), err));
            PipelineError::from(err)
        })?;
        self.logger.trace(&format!("sent {}", command));
        Ok(())
    }

    pub fn snapshot(&self) -> RadarSnapshot {
        self.read().snapshot()
    }

    /// Smoothed sweep angle for the display, or 0 when not connected.
    pub fn displayed_angle(&self) -> f64 {
        self.sweep.as_ref().map(SweepLoop::displayed).unwrap_or_default()
    }

    pub fn clear_targets(&self) {
        self.write().clear_targets();
    }

    pub fn clear_history(&self) {
        self.write().clear_history();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RadarPipeline> {
        self.pipeline.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RadarPipeline> {
        self.pipeline.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RadarSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
