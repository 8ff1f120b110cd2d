//! EventPump - service callbacks → bounded channel → DataStore

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{DropPolicy, EventSink, IngestionConfig, SensorEvent, TrackingEvent};
use parking_lot::Mutex;
use sample_store::DataStore;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::IngestionMetrics;
use crate::{IngestionError, Result};

/// Single consumer of every sensor event
///
/// Service threads hand events to [`EventPump::sink`]; one pump thread
/// publishes them into the data store in arrival order.
pub struct EventPump {
    tx: Sender<SensorEvent>,
    /// Kept for `DropOldest`: the sender side pops the head when full
    rx: Receiver<SensorEvent>,
    drop_policy: DropPolicy,
    metrics: Arc<IngestionMetrics>,
    handle: Mutex<Option<JoinHandle<u64>>>,
}

impl EventPump {
    /// Create the channel and start the pump thread
    #[instrument(
        name = "event_pump_start",
        skip(store, config),
        fields(capacity = config.channel_capacity, policy = ?config.drop_policy)
    )]
    pub fn start(store: Arc<DataStore>, config: &IngestionConfig) -> Result<Self> {
        let (tx, rx) = bounded(config.channel_capacity.max(1));
        let metrics = Arc::new(IngestionMetrics::new());

        let pump_rx = rx.clone();
        let pump_metrics = metrics.clone();
        let handle = thread::Builder::new()
            .name("event-pump".to_string())
            .spawn(move || run_pump(&store, &pump_rx, &pump_metrics))
            .map_err(|e| IngestionError::spawn("event-pump", e))?;

        info!("event pump started");
        Ok(Self {
            tx,
            rx,
            drop_policy: config.drop_policy,
            metrics,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Callback to hand to the sensor service
    pub fn sink(&self) -> EventSink {
        let tx = self.tx.clone();
        let rx = self.rx.clone();
        let policy = self.drop_policy;
        let metrics = self.metrics.clone();
        Arc::new(move |event| send_event(&tx, &rx, event, policy, &metrics))
    }

    /// Enqueue one event directly
    pub fn send(&self, event: SensorEvent) -> Result<()> {
        if self.tx.is_closed() {
            return Err(IngestionError::PumpStopped);
        }
        send_event(&self.tx, &self.rx, event, self.drop_policy, &self.metrics);
        Ok(())
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Close the channel, let the pump drain what is queued, then join it
    ///
    /// Returns the number of events the pump handled, `None` if already stopped.
    pub fn stop(&self) -> Option<u64> {
        self.tx.close();
        let handle = self.handle.lock().take()?;
        match handle.join() {
            Ok(handled) => {
                info!(handled, "event pump stopped");
                Some(handled)
            }
            Err(_) => {
                warn!("event pump panicked");
                None
            }
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Send with backpressure handling
#[inline]
fn send_event(
    tx: &Sender<SensorEvent>,
    rx: &Receiver<SensorEvent>,
    event: SensorEvent,
    drop_policy: DropPolicy,
    metrics: &IngestionMetrics,
) {
    let kind = event.kind();
    let event = match tx.try_send(event) {
        Ok(()) => {
            metrics.record_received();
            metrics.update_queue_len(tx.len());
            trace!(kind, "event queued");
            return;
        }
        Err(TrySendError::Full(event)) => event,
        Err(TrySendError::Closed(_)) => {
            trace!(kind, "event after pump stopped, ignored");
            return;
        }
    };

    match drop_policy {
        DropPolicy::DropNewest => {
            metrics.record_dropped();
            observability::record_event_dropped(kind);
            trace!(kind, "event dropped (newest)");
        }
        DropPolicy::DropOldest => {
            if let Ok(oldest) = rx.try_recv() {
                metrics.record_dropped();
                observability::record_event_dropped(oldest.kind());
                trace!(kind = oldest.kind(), "event dropped (oldest)");
            }
            match tx.try_send(event) {
                Ok(()) => metrics.record_received(),
                Err(_) => {
                    // Another producer refilled the slot first
                    metrics.record_dropped();
                    observability::record_event_dropped(kind);
                }
            }
        }
    }
}

/// Pump loop; returns the number of events handled
fn run_pump(store: &DataStore, rx: &Receiver<SensorEvent>, metrics: &IngestionMetrics) -> u64 {
    let mut handled = 0;
    while let Ok(event) = rx.recv_blocking() {
        handled += 1;
        if dispatch(store, event) {
            metrics.record_published();
        } else {
            metrics.record_publish_error();
        }
    }
    debug!(handled, "event channel closed");
    handled
}

/// Route one event into the store; false if the store rejected it
fn dispatch(store: &DataStore, event: SensorEvent) -> bool {
    let published = match &event {
        SensorEvent::Pose(s) => store.publish_pose(s.timestamp, &s.payload).is_ok(),
        SensorEvent::PointCloud(s) => store.publish_point_cloud(s.timestamp, &s.payload).is_ok(),
        SensorEvent::ColorFrame(s) => store.publish_color_frame(s.timestamp, &s.payload).is_ok(),
        SensorEvent::Tracking(TrackingEvent::Lost) => {
            warn!("tracking lost");
            store.mark_tracking_lost();
            true
        }
        SensorEvent::Tracking(TrackingEvent::Acquired) => {
            info!("tracking acquired");
            true
        }
    };
    trace!(kind = event.kind(), timestamp = ?event.timestamp(), published, "event dispatched");
    published
}
