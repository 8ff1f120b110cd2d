//! # Contracts
//!
//! Shared data model and boundary traits of the RGB-D capture pipeline.
//! All business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses the sensing service timestamp (seconds, f64) as the only clock
//! - Streams are independently clocked; alignment is nearest-timestamp

mod config;
mod error;
mod event;
mod sample;
mod sensor;
mod service;

pub use config::*;
pub use error::*;
pub use event::{EventSink, SensorEvent, TrackingEvent};
pub use sample::{is_valid_timestamp, Sample};
pub use sensor::*;
pub use service::{SensorService, TransformProvider};
