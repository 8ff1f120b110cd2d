//! Mock 传感器服务
//!
//! 无真实设备时使用：每个流一个线程，按配置频率产生位姿、点云与 NV21 彩色帧，
//! 共享同一个服务时钟。

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use contracts::{
    ContractError, EventSink, Sample, SensorEvent, SensorService, SessionConfig, TrackingEvent,
};
use parking_lot::Mutex;
use scheduler::PeriodicTask;
use tracing::{debug, info, instrument, trace, warn};

use crate::synthetic::{synthetic_cloud, synthetic_nv21, synthetic_pose};

struct Connection {
    sink: EventSink,
    streams: Vec<PeriodicTask>,
}

/// Mock sensing service
pub struct MockSensorService {
    config: SessionConfig,
    connected: AtomicBool,
    connection: Mutex<Option<Connection>>,
}

impl MockSensorService {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            connected: AtomicBool::new(false),
            connection: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Deliver a tracking-lost notification, as a real service does on relocalization
    pub fn report_tracking_lost(&self) -> bool {
        self.emit(SensorEvent::Tracking(TrackingEvent::Lost))
    }

    /// Deliver an arbitrary event through the connected sink
    pub fn emit(&self, event: SensorEvent) -> bool {
        match self.connection.lock().as_ref() {
            Some(conn) => {
                (conn.sink)(event);
                true
            }
            None => false,
        }
    }

    /// One fixed-rate task per stream; on failure the ones already spawned are dropped (stopped)
    fn spawn_streams(&self, sink: &EventSink) -> Result<Vec<PeriodicTask>, ContractError> {
        let clock = Instant::now();
        let cfg = &self.config;

        let (points, depth) = (cfg.points_per_cloud, cfg.scene_depth_m);
        let (width, height) = (cfg.image_width, cfg.image_height);
        let exposure_ns = (1e9 / cfg.color_rate_hz) as i64;

        let streams: [(&str, f64, StreamFn); 3] = [
            (
                "mock-pose",
                cfg.pose_rate_hz,
                Box::new(|t: f64, _: u64| SensorEvent::Pose(Sample::new(t, synthetic_pose(t)))),
            ),
            (
                "mock-depth",
                cfg.point_cloud_rate_hz,
                Box::new(move |t: f64, _: u64| {
                    SensorEvent::PointCloud(Sample::new(t, synthetic_cloud(points, depth, t)))
                }),
            ),
            (
                "mock-color",
                cfg.color_rate_hz,
                Box::new(move |t: f64, seq: u64| {
                    SensorEvent::ColorFrame(Sample::new(
                        t,
                        synthetic_nv21(width, height, seq as i64, exposure_ns),
                    ))
                }),
            ),
        ];

        let mut tasks = Vec::with_capacity(streams.len());
        for (name, rate_hz, mut make_event) in streams {
            let sink = sink.clone();
            let mut seq: u64 = 0;
            let task = PeriodicTask::spawn_fixed_rate(
                name,
                Duration::from_secs_f64(1.0 / rate_hz),
                move || {
                    let timestamp = clock.elapsed().as_secs_f64();
                    sink(make_event(timestamp, seq));
                    trace!(stream = name, seq, timestamp, "mock event emitted");
                    seq += 1;
                    ControlFlow::Continue(())
                },
            )
            .map_err(|e| ContractError::session_fault(format!("failed to spawn {name}: {e}")))?;
            tasks.push(task);
        }
        Ok(tasks)
    }
}

impl SensorService for MockSensorService {
    fn name(&self) -> &str {
        "mock"
    }

    #[instrument(name = "mock_service_connect", skip(self, sink), fields(app = %self.config.app_name))]
    fn connect(&self, sink: EventSink) -> Result<(), ContractError> {
        if self.config.fail_connect {
            warn!("mock service configured to refuse connections");
            return Err(ContractError::session_fault(
                "sensing service refused the connection",
            ));
        }

        let mut connection = self.connection.lock();
        if connection.is_some() {
            debug!("already connected");
            return Ok(());
        }

        let streams = self.spawn_streams(&sink)?;
        sink(SensorEvent::Tracking(TrackingEvent::Acquired));

        *connection = Some(Connection { sink, streams });
        self.connected.store(true, Ordering::SeqCst);
        info!(
            pose_hz = self.config.pose_rate_hz,
            point_cloud_hz = self.config.point_cloud_rate_hz,
            color_hz = self.config.color_rate_hz,
            width = self.config.image_width,
            height = self.config.image_height,
            "mock service connected"
        );
        Ok(())
    }

    #[instrument(name = "mock_service_disconnect", skip(self))]
    fn disconnect(&self) {
        let Some(conn) = self.connection.lock().take() else {
            return;
        };
        self.connected.store(false, Ordering::SeqCst);
        let events: u64 = conn.streams.iter().filter_map(PeriodicTask::stop).sum();
        info!(events, "mock service disconnected");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for MockSensorService {
    fn drop(&mut self) {
        self.disconnect();
    }
}

type StreamFn = Box<dyn FnMut(f64, u64) -> SensorEvent + Send>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    fn fast_config() -> SessionConfig {
        SessionConfig {
            pose_rate_hz: 200.0,
            point_cloud_rate_hz: 100.0,
            color_rate_hz: 100.0,
            image_width: 16,
            image_height: 8,
            points_per_cloud: 50,
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct Counts {
        pose: AtomicUsize,
        cloud: AtomicUsize,
        color: AtomicUsize,
        tracking: AtomicUsize,
    }

    fn counting_sink(counts: Arc<Counts>) -> EventSink {
        Arc::new(move |event| {
            let counter = match event {
                SensorEvent::Pose(s) => {
                    assert!(s.timestamp >= 0.0);
                    &counts.pose
                }
                SensorEvent::PointCloud(s) => {
                    assert_eq!(s.payload.num_points, 50);
                    &counts.cloud
                }
                SensorEvent::ColorFrame(s) => {
                    assert_eq!((s.payload.width, s.payload.height), (16, 8));
                    &counts.color
                }
                SensorEvent::Tracking(_) => &counts.tracking,
            };
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_connect_streams_and_disconnect() {
        let service = MockSensorService::new(fast_config());
        let counts = Arc::new(Counts::default());
        assert!(!service.is_connected());

        service.connect(counting_sink(counts.clone())).unwrap();
        assert!(service.is_connected());
        // Second connect is a no-op
        service.connect(counting_sink(counts.clone())).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while counts.cloud.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(service.report_tracking_lost());
        service.disconnect();
        assert!(!service.is_connected());

        assert!(counts.pose.load(Ordering::SeqCst) > 0);
        assert!(counts.cloud.load(Ordering::SeqCst) >= 3);
        assert!(counts.color.load(Ordering::SeqCst) > 0);
        // Acquired on connect, then the injected loss
        assert_eq!(counts.tracking.load(Ordering::SeqCst), 2);

        // Nothing is delivered once disconnected
        let before = counts.pose.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counts.pose.load(Ordering::SeqCst), before);
        assert!(!service.report_tracking_lost());
    }

    #[test]
    fn test_refused_connection_is_session_fault() {
        let service = MockSensorService::new(SessionConfig {
            fail_connect: true,
            ..fast_config()
        });
        let err = service
            .connect(counting_sink(Arc::new(Counts::default())))
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(!service.is_connected());
    }
}
