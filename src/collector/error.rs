//! Collection error types.

use thiserror::Error;

use crate::day::Day;
use crate::sink::SinkError;
use crate::storage::StorageError;

/// Errors that abort the collection of a day.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// An aggregate query failed.
    #[error("query failed for {day}: {source}")]
    Query {
        /// Day being collected.
        day: Day,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// The sink rejected or failed the write.
    #[error("write failed for {day}: {source}")]
    Sink {
        /// Day being collected.
        day: Day,
        /// Underlying sink error.
        #[source]
        source: SinkError,
    },
}

impl CollectorError {
    /// Day whose collection failed.
    pub fn day(&self) -> Day {
        match self {
            Self::Query { day, .. } | Self::Sink { day, .. } => *day,
        }
    }
}
