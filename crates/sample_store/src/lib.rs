//! # Sample Store
//!
//! 时间戳索引的传感器样本缓存。
//!
//! 负责：
//! - 每个流一个固定容量的 `TimestampCache`
//! - 按最近时间戳取用 (consume) 并回收槽位
//! - `DataStore` 门面：生产者发布，融合/录制消费
//!
//! ## 使用示例
//!
//! ```ignore
//! use sample_store::DataStore;
//!
//! let store = DataStore::default();
//! store.publish_point_cloud(ts, &cloud)?;
//!
//! if let Some(cloud) = store.latest_point_cloud() {
//!     let pose = store.pose_near(cloud.timestamp);
//! }
//! ```

mod cache;
mod error;
mod payload;
mod store;

pub use cache::TimestampCache;
pub use error::{CacheError, Result};
pub use payload::CachePayload;
pub use store::{DataStore, StoreStats};
