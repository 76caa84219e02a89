//! Sink contract.

use crate::point::MetricPoint;
use crate::sink::SinkError;

/// Persists a day's batch of points in one call.
#[async_trait::async_trait]
pub trait PointSink: Send + Sync {
    /// Write the whole batch. Implementations create their target lazily
    /// before the first write.
    async fn write_points(&self, points: &[MetricPoint]) -> Result<(), SinkError>;
}

