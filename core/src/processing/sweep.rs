use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::prelude::SweepConfig;
use crate::telemetry::log::LogManager;

/// Eases the displayed sweep angle toward the latest reported angle.
#[derive(Debug, Clone)]
pub struct SweepSmoother {
    displayed: f64,
    easing: f64,
    snap_deg: f64,
}

impl SweepSmoother {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            displayed: 0.0,
            easing: config.easing,
            snap_deg: config.snap_deg,
        }
    }

    /// One display tick: cover `easing` of the remaining difference, or
    /// snap once the difference is below `snap_deg`.
    pub fn tick(&mut self, target: f64) -> f64 {
        let diff = target - self.displayed;
        if diff.abs() < self.snap_deg {
            self.displayed = target;
        } else {
            self.displayed += diff * self.easing;
        }
        self.displayed
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }
}

/// Periodic task driving a [`SweepSmoother`] from a shared angle source.
///
/// Ticks run one after another on a single task; a late tick is skipped
/// rather than replayed. `stop` can be called any number of times.
pub struct SweepLoop {
    displayed: Arc<RwLock<f64>>,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
    logger: LogManager,
}

impl SweepLoop {
    /// Spawns the loop on the current tokio runtime. `target` is read once per tick.
    pub fn start<F>(config: &SweepConfig, target: F) -> Self
    where
        F: Fn() -> f64 + Send + 'static,
    {
        let displayed = Arc::new(RwLock::new(0.0));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut smoother = SweepSmoother::new(config);
        let period = Duration::from_millis(config.tick_ms.max(1));
        let shared = displayed.clone();
        let logger = LogManager::new("sweep");

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let angle = smoother.tick(target());
                        if let Ok(mut guard) = shared.write() {
                            *guard = angle;
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            logger.trace("sweep loop exited");
        });

        Self {
            displayed,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
            logger,
        }
    }

    pub fn displayed(&self) -> f64 {
        self.displayed.read().map(|angle| *angle).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the loop to exit. Returns the join handle the first time so
    /// callers can await completion.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let shutdown = self.shutdown.take()?;
        let _ = shutdown.send(true);
        self.logger.trace("sweep loop stop requested");
        self.handle.take()
    }
}

impl Drop for SweepLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
