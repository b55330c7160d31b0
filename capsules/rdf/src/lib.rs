//! Per-motor streaming telemetry recorder: a fixed parameter enumeration,
//! recorder slots that stage and pack selected fields, and the single
//! consumer logger task that owns every RDF file handle.

pub mod logger;
pub mod manager;
pub mod queue;
pub mod variables;

pub use logger::LoggerTask;
pub use manager::{RdfRecorders, MAX_RECORDERS};
pub use queue::{channel, EventSink, LoggerEvent, MAX_SAMPLE_BYTES};
pub use variables::{StreamValue, MAX_VARS};
