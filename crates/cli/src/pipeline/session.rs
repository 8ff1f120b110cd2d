//! Capture session - wires every component and owns the shutdown order.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AppConfig, RecordingMode, SensorService, TransformProvider};
use fusion::{FrameBuffer, FusionLoop, FusionProcessor};
use ingestion::{EventPump, MockSensorService, StaticTransformProvider};
use recorder::{Recorder, RecorderSettings, RecordingLoop};
use sample_store::DataStore;
use tracing::{debug, info, instrument, warn};

use super::{PreviewMonitor, SessionStats};
use crate::error::CliError;

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    Timeout,
    MaxFrames,
    /// The service dropped the connection
    Disconnected,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Signal => "shutdown signal",
            StopReason::Timeout => "timeout",
            StopReason::MaxFrames => "max frames reached",
            StopReason::Disconnected => "service disconnected",
        })
    }
}

/// A running capture session
///
/// Startup order: store, pump, recorder, service connection, fusion loop,
/// optional recording loop, preview monitor. Shutdown runs it backwards from
/// the producers: disconnect, drain the pump, stop the loops, close files.
pub struct CaptureSession {
    store: Arc<DataStore>,
    pump: EventPump,
    service: Arc<MockSensorService>,
    recorder: Option<Arc<Recorder>>,
    fusion: FusionLoop,
    recording: Option<RecordingLoop>,
    monitor: PreviewMonitor,
    started: Instant,
}

impl CaptureSession {
    #[instrument(name = "session_start", skip(config), fields(app = %config.session.app_name))]
    pub fn start(config: &AppConfig) -> Result<Self> {
        let started = Instant::now();
        let store = Arc::new(DataStore::new(&config.cache));
        let pump = EventPump::start(store.clone(), &config.ingestion)
            .map_err(|e| CliError::startup("event pump", e.to_string()))?;

        let recorder = if config.recorder.enabled {
            let recorder = Arc::new(Recorder::new(RecorderSettings::from_config(
                &config.recorder,
                &config.session.app_name,
            )));
            // A recorder that failed to open stays disabled; the monitor reports it
            if let Err(e) = recorder.start() {
                warn!(error = %e, "recording disabled for this session");
            }
            Some(recorder)
        } else {
            None
        };

        let service = Arc::new(MockSensorService::new(config.session.clone()));
        if let Err(e) = service.connect(pump.sink()) {
            if let Some(recorder) = &recorder {
                recorder.stop();
            }
            return Err(CliError::session_fault(e.to_string()).into());
        }
        info!(service = service.name(), "sensing service connected");

        let transforms: Arc<dyn TransformProvider> = Arc::new(StaticTransformProvider::new(
            &config.fusion.extrinsics,
            service.clone(),
        ));
        let frames = Arc::new(FrameBuffer::new());

        let mut processor =
            FusionProcessor::new(&config.fusion, store.clone(), transforms, frames.clone());
        let threaded = config.recorder.mode == RecordingMode::Threaded;
        if let (Some(recorder), false) = (&recorder, threaded) {
            processor = processor.with_recorder(recorder.clone());
        }

        let fusion = FusionLoop::spawn(processor, Duration::from_millis(config.fusion.interval_ms))
            .map_err(|e| CliError::startup("fusion loop", e.to_string()))?;

        let recording = match (&recorder, threaded) {
            (Some(recorder), true) => Some(
                RecordingLoop::spawn(
                    store.clone(),
                    recorder.clone(),
                    Duration::from_millis(config.recorder.interval_ms),
                )
                .map_err(|e| CliError::startup("recording loop", e.to_string()))?,
            ),
            _ => None,
        };

        let monitor = PreviewMonitor::spawn(
            frames,
            recorder.clone(),
            fusion.aggregator().clone(),
            Duration::from_millis(config.preview.interval_ms),
        )
        .map_err(|e| CliError::startup("preview monitor", e.to_string()))?;

        info!(
            recording = recorder.is_some(),
            threaded_recording = recording.is_some(),
            fusion_interval_ms = config.fusion.interval_ms,
            "capture session started"
        );

        Ok(Self {
            store,
            pump,
            service,
            recorder,
            fusion,
            recording,
            monitor,
            started,
        })
    }

    pub fn produced_frames(&self) -> u64 {
        self.fusion.aggregator().lock().produced_frames
    }

    /// Wait for a signal, the timeout, the frame limit or a lost connection
    pub async fn run_until(&self, max_frames: Option<u64>, timeout: Option<Duration>) -> StopReason {
        let deadline = async {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending::<()>().await,
            }
        };

        let watch = async {
            let mut ticker = tokio::time::interval(Duration::from_millis(50));
            loop {
                ticker.tick().await;
                if !self.service.is_connected() {
                    return StopReason::Disconnected;
                }
                if let Some(max) = max_frames {
                    if self.produced_frames() >= max {
                        return StopReason::MaxFrames;
                    }
                }
            }
        };

        tokio::select! {
            _ = shutdown_signal() => StopReason::Signal,
            _ = deadline => StopReason::Timeout,
            reason = watch => reason,
        }
    }

    /// Stop everything and collect the run statistics
    #[instrument(name = "session_shutdown", skip(self))]
    pub fn shutdown(self, stop_reason: StopReason) -> SessionStats {
        info!(reason = %stop_reason, "shutting down capture session");

        self.service.disconnect();
        let handled = self.pump.stop().unwrap_or(0);
        let cycles = self.fusion.stop();
        let passes = self.recording.as_ref().and_then(RecordingLoop::stop);
        let ticks = self.monitor.stop();
        debug!(?cycles, ?passes, ?ticks, "capture loops stopped");

        let (session_dir, recorder_metrics) = match &self.recorder {
            Some(recorder) => {
                let failed = recorder.stop();
                if failed > 0 {
                    warn!(failed, "some record streams failed to close");
                }
                (recorder.session_dir(), Some(recorder.metrics()))
            }
            None => (None, None),
        };
        self.monitor.flush_faults();

        let ingestion = self.pump.metrics().snapshot();
        let stats = SessionStats {
            stop_reason,
            duration: self.started.elapsed(),
            events_handled: handled,
            events_dropped: ingestion.events_dropped,
            publish_errors: ingestion.publish_errors,
            previews: self.monitor.previews(),
            fusion: self.fusion.summary(),
            session_dir,
            records_written: recorder_metrics.map_or(0, |m| m.records_written),
            bytes_written: recorder_metrics.map_or(0, |m| m.bytes_written),
        };

        let occupancy = self.store.stats();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            produced = stats.fusion.produced_frames,
            fps = format!("{:.2}", stats.fps()),
            pose_left = occupancy.pose_occupied,
            point_cloud_left = occupancy.point_cloud_occupied,
            color_left = occupancy.color_occupied,
            "capture session finished"
        );
        stats
    }
}

/// Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
