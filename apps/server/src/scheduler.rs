//! The two long-running loops: periodic price checks and inbound commands.

use crate::config::LoopTimings;
use ratewatch_alerts::{CommandListener, EventSink, MonitorEvent, PriceMonitor};
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Stop signal shared by both loops. Raising it wakes any pending sleep.
#[derive(Debug, Default)]
pub struct Shutdown {
    stopped: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless shutdown is raised first.
    /// Returns true if the loop should keep running.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.notify.notified();
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_triggered(),
            _ = notified => false,
        }
    }
}

/// Periodic price check loop.
///
/// Each iteration sleeps `price_check_interval` first, then checks. A failed
/// check is reported and followed by an extra `retry_delay` pause.
pub async fn run_price_loop(
    monitor: Arc<PriceMonitor>,
    timings: LoopTimings,
    shutdown: Arc<Shutdown>,
    events: Arc<dyn EventSink>,
) {
    info!(
        interval_secs = timings.price_check_interval.as_secs(),
        "Starting price monitor loop"
    );

    while shutdown.sleep(timings.price_check_interval).await {
        if let Err(e) = monitor.check_price().await {
            events.emit(MonitorEvent::LoopError {
                task: "price",
                error: e.to_string(),
            });
            if !shutdown.sleep(timings.retry_delay).await {
                break;
            }
        }
    }

    info!("Price monitor loop stopped");
}

/// Inbound message loop: poll, handle, pause.
///
/// A failed poll is reported and followed by `retry_delay` instead of the
/// normal `message_check_interval`.
pub async fn run_message_loop(
    mut listener: CommandListener,
    timings: LoopTimings,
    shutdown: Arc<Shutdown>,
    events: Arc<dyn EventSink>,
) {
    info!("Starting message listener loop");

    loop {
        let pause = match listener.poll_once().await {
            Ok(_) => timings.message_check_interval,
            Err(e) => {
                events.emit(MonitorEvent::LoopError {
                    task: "messages",
                    error: e.to_string(),
                });
                timings.retry_delay
            }
        };
        if !shutdown.sleep(pause).await {
            break;
        }
    }

    info!(cursor = ?listener.cursor(), "Message listener loop stopped");
}

/// Resolve once `signal` fires.
///
/// If the signal cannot be installed the error is logged and this never
/// resolves: the loops keep running until the process is killed.
pub async fn wait_for_stop_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }
}

/// Handles of the two spawned loops.
pub struct LoopHandles {
    pub price: JoinHandle<()>,
    pub messages: JoinHandle<()>,
}

/// Spawn both loops on the current runtime.
pub fn spawn_loops(
    monitor: Arc<PriceMonitor>,
    listener: CommandListener,
    timings: LoopTimings,
    shutdown: Arc<Shutdown>,
    events: Arc<dyn EventSink>,
) -> LoopHandles {
    let price = tokio::spawn(run_price_loop(
        monitor,
        timings,
        shutdown.clone(),
        events.clone(),
    ));
    let messages = tokio::spawn(run_message_loop(listener, timings, shutdown, events));
    LoopHandles { price, messages }
}
