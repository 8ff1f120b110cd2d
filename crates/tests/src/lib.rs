//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 → 组件装配
//! - 事件泵 → DataStore → 融合 → 帧缓冲 e2e
//! - Mock 会话录制与回读

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use sample_store::DataStore;

    #[test]
    fn test_loaded_config_sizes_the_store() {
        let config = ConfigLoader::load_from_str(
            r#"
            [cache]
            pose_capacity = 3
            point_cloud_capacity = 2

            [fusion]
            max_depth_m = 5.0
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let store = DataStore::new(&config.cache);
        assert_eq!(store.pose_cache().capacity(), 3);
        assert_eq!(store.point_cloud_cache().capacity(), 2);
        assert_eq!(store.color_cache().capacity(), 7);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{
        AppConfig, ColorImage, ColorRecordMode, DepthRecordMode, EventSink, FusionConfig,
        ImageFormat, IngestionConfig, PointCloud, PoseData, PoseStatus, Sample, SensorEvent,
        SensorService, SessionConfig, TrackingEvent,
    };
    use fusion::{CycleOutcome, FrameBuffer, FusionLoop, FusionProcessor, SkipReason};
    use ingestion::{EventPump, MockSensorService, StaticTransformProvider};
    use recorder::reader::{read_color_frames, read_depth_frames, read_pose_records};
    use recorder::{Recorder, RecorderSettings, SessionSummary};
    use sample_store::DataStore;

    fn scenario_events(ts: f64) -> Vec<SensorEvent> {
        let points: Vec<[f32; 3]> = (0..100)
            .map(|i| {
                let gx = (i % 10) as f32 / 10.0 - 0.45;
                let gy = (i / 10) as f32 / 10.0 - 0.45;
                [gx * 0.6, gy * 0.6, 1.0]
            })
            .collect();
        vec![
            SensorEvent::Pose(Sample::new(
                ts,
                PoseData {
                    rotation: [0.0, 0.0, 0.0, 1.0],
                    translation: [0.0; 3],
                    status: PoseStatus::Valid,
                    ..Default::default()
                },
            )),
            SensorEvent::PointCloud(Sample::new(ts, PointCloud::from_xyz(&points))),
            SensorEvent::ColorFrame(Sample::new(
                ts,
                ColorImage {
                    width: 4,
                    height: 4,
                    stride: 4,
                    format: ImageFormat::YCrCb420Sp,
                    data: vec![128; 96],
                    ..Default::default()
                },
            )),
        ]
    }

    fn silent_sink() -> EventSink {
        Arc::new(|_: SensorEvent| {})
    }

    /// Mock service that only provides connectivity for the transform provider
    fn quiet_service() -> Arc<MockSensorService> {
        Arc::new(MockSensorService::new(SessionConfig {
            pose_rate_hz: 1.0,
            point_cloud_rate_hz: 1.0,
            color_rate_hz: 1.0,
            image_width: 4,
            image_height: 4,
            points_per_cloud: 4,
            ..Default::default()
        }))
    }

    /// Pump the events into a fresh store and wait for them to land
    fn store_with(events: Vec<SensorEvent>) -> Arc<DataStore> {
        let store = Arc::new(DataStore::default());
        let pump = EventPump::start(store.clone(), &IngestionConfig::default()).unwrap();
        for event in events {
            pump.send(event).unwrap();
        }
        pump.stop();
        store
    }

    fn processor_for(
        store: &Arc<DataStore>,
        service: &Arc<MockSensorService>,
    ) -> (FusionProcessor, Arc<FrameBuffer>) {
        let frames = Arc::new(FrameBuffer::new());
        let config = FusionConfig::default();
        let transforms = Arc::new(StaticTransformProvider::new(
            &config.extrinsics,
            service.clone(),
        ));
        let processor = FusionProcessor::new(&config, store.clone(), transforms, frames.clone());
        (processor, frames)
    }

    /// End-to-end: EventPump -> DataStore -> FusionProcessor -> FrameBuffer
    #[test]
    fn test_e2e_four_by_four_scenario() {
        let store = store_with(scenario_events(1.0));
        let service = quiet_service();
        service.connect(silent_sink()).unwrap();
        let (mut processor, frames) = processor_for(&store, &service);

        assert_eq!(processor.run_cycle(), CycleOutcome::Produced { recorded: false });

        let frame = frames.snapshot().unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));
        assert_eq!(frame.color_rgba.len(), 64);
        assert_eq!(frame.depth_vis_rgba.len(), 64);
        assert_eq!(frame.timestamp, 1.0);

        let mut color = [0u8; 64];
        let mut depth = [0u8; 64];
        let info = frames.copy_out(&mut color, &mut depth).unwrap();
        assert_eq!(info.generation, 1);
        assert_eq!(&color[..], &frame.color_rgba[..]);

        // Every sample was consumed
        let stats = store.stats();
        assert_eq!(
            (stats.pose_occupied, stats.point_cloud_occupied, stats.color_occupied),
            (0, 0, 0)
        );
        assert_eq!(processor.run_cycle(), CycleOutcome::Skipped(SkipReason::NoPointCloud));
    }

    #[test]
    fn test_e2e_waits_for_service_connection() {
        let service = quiet_service();
        let store = store_with(scenario_events(1.0));
        let (mut processor, frames) = processor_for(&store, &service);

        assert_eq!(
            processor.run_cycle(),
            CycleOutcome::Skipped(SkipReason::TrackingUnavailable)
        );
        assert!(!frames.is_buffer_ready());

        service.connect(silent_sink()).unwrap();
        for event in scenario_events(2.0) {
            match event {
                SensorEvent::Pose(s) => store.publish_pose(s.timestamp, &s.payload).unwrap(),
                SensorEvent::PointCloud(s) => {
                    store.publish_point_cloud(s.timestamp, &s.payload).unwrap()
                }
                SensorEvent::ColorFrame(s) => {
                    store.publish_color_frame(s.timestamp, &s.payload).unwrap()
                }
                SensorEvent::Tracking(_) => unreachable!(),
            };
        }
        assert!(processor.run_cycle().is_produced());
        assert_eq!(frames.snapshot().unwrap().timestamp, 2.0);
    }

    #[test]
    fn test_e2e_tracking_lost_invalidates_transform() {
        let store = store_with(scenario_events(1.0));
        let service = quiet_service();
        service.connect(silent_sink()).unwrap();
        let (mut processor, _) = processor_for(&store, &service);

        assert!(processor.run_cycle().is_produced());
        let epoch = processor.relative_transform().unwrap().tracking_epoch();

        let pump = EventPump::start(store.clone(), &IngestionConfig::default()).unwrap();
        pump.send(SensorEvent::Tracking(TrackingEvent::Lost)).unwrap();
        for event in scenario_events(2.0) {
            pump.send(event).unwrap();
        }
        pump.stop();

        assert_eq!(store.tracking_epoch(), epoch + 1);
        assert!(processor.run_cycle().is_produced());
        assert_eq!(
            processor.relative_transform().unwrap().tracking_epoch(),
            epoch + 1
        );
    }

    /// Full mock session with inline recording, then read the files back
    #[test]
    fn test_e2e_mock_session_inline_recording() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.session = SessionConfig {
            app_name: "e2e".to_string(),
            pose_rate_hz: 200.0,
            point_cloud_rate_hz: 50.0,
            color_rate_hz: 100.0,
            image_width: 16,
            image_height: 8,
            points_per_cloud: 100,
            ..Default::default()
        };
        config.recorder.enabled = true;
        config.recorder.base_dir = tmp.path().display().to_string();
        config.recorder.depth_mode = DepthRecordMode::DepthImage;
        config.recorder.color_mode = ColorRecordMode::Rgba;
        config_loader::ConfigLoader::validate(&config).unwrap();

        let store = Arc::new(DataStore::new(&config.cache));
        let pump = EventPump::start(store.clone(), &config.ingestion).unwrap();
        let recorder = Arc::new(Recorder::new(RecorderSettings::from_config(
            &config.recorder,
            &config.session.app_name,
        )));
        let dir = recorder.start().unwrap();

        let service = Arc::new(MockSensorService::new(config.session.clone()));
        service.connect(pump.sink()).unwrap();
        let (processor, frames) = processor_for(&store, &service);
        let fusion = FusionLoop::spawn(
            processor.with_recorder(recorder.clone()),
            Duration::from_millis(5),
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while fusion.summary().recorded_frames < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        service.disconnect();
        pump.stop();
        fusion.stop();
        assert_eq!(recorder.stop(), 0);
        assert!(recorder.drain_faults().is_empty());

        let recorded = fusion.summary().recorded_frames as usize;
        assert!(recorded >= 3);
        assert_eq!(frames.image_size(), (16, 8));

        let poses = read_pose_records(&dir.join("pose.bin")).unwrap();
        assert_eq!(poses.len(), recorded);
        assert!(poses.iter().all(|r| r.pose.is_valid()));
        assert!(poses.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        assert_eq!(read_color_frames(&dir.join("color.bin"), 16 * 8 * 4).unwrap().len(), recorded);
        let depth = read_depth_frames(&dir.join("depth.bin"), 16 * 8).unwrap();
        assert_eq!(depth.len(), recorded);
        // The synthetic wall sits in front of the camera
        assert!(depth[0].iter().any(|d| d.is_finite() && *d > 0.0));

        let summary = SessionSummary::load(&dir).unwrap();
        assert_eq!(summary.pose_records, recorded);
        assert_eq!(summary.point_cloud_records, 0);
    }
}
