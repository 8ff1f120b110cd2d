//! # Ingestion
//!
//! Sensor event ingestion.
//!
//! Responsibilities:
//! - Bounded event channel with drop policy (`EventPump`)
//! - One pump thread publishing every event into the `DataStore`
//! - Mock sensing service with synthetic pose / point cloud / NV21 streams
//! - Static-extrinsics `TransformProvider`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{EventPump, MockSensorService, StaticTransformProvider};
//! use contracts::SensorService;
//!
//! let pump = EventPump::start(store.clone(), &config.ingestion)?;
//! let service = Arc::new(MockSensorService::new(config.session.clone()));
//! service.connect(pump.sink())?;
//!
//! let transforms = StaticTransformProvider::new(&config.fusion.extrinsics, service.clone());
//! // ...
//! service.disconnect();
//! pump.stop();
//! ```

mod config;
mod error;
mod mock;
mod pump;
mod synthetic;
mod transform;

pub use config::{IngestionMetrics, MetricsSnapshot};
pub use error::{IngestionError, Result};
pub use mock::MockSensorService;
pub use pump::EventPump;
pub use synthetic::{synthetic_cloud, synthetic_nv21, synthetic_pose};
pub use transform::StaticTransformProvider;
