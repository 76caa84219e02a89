//! Time-Series Sink
//!
//! Persists each day's points in a single batch:
//! - [`PointSink`]: write contract used by the collector
//! - [`InfluxSink`]: InfluxDB 1.x HTTP implementation with create-if-absent bootstrap
//! - [`encode_point`] / [`encode_batch`]: line protocol rendering

mod error;
mod influx;
mod line_protocol;
mod traits;

pub use error::SinkError;
pub use influx::{DEFAULT_PORT, DEFAULT_TIMEOUT, InfluxConfig, InfluxSink};
pub use line_protocol::{encode_batch, encode_point};
pub use traits::PointSink;
