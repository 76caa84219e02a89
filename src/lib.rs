//! Apollo Monitor - Annotation Metrics Collector
//!
//! Computes daily aggregates (organisms, genes, users, genes per organism,
//! genes per user) from an Apollo annotation database and forwards them as
//! time-stamped points to InfluxDB.
//!
//! # Architecture
//!
//! - **Storage**: parameterized aggregate queries against PostgreSQL
//! - **Points**: pure construction of tagged measurement points
//! - **Collector**: per-day orchestration and the date-range driver
//! - **Sink**: batched InfluxDB writes with create-if-absent bootstrap
//! - **Config**: validated run configuration
//!
//! # Example
//!
//! ```rust
//! use apollo_monitor::{Day, EntityCounts, Dimension, Measurement, PointBuilder};
//!
//! let builder = PointBuilder::new("apollo", "main");
//! let counts = EntityCounts::from([("homo_sapiens".to_string(), 12)]);
//! let day = Day::from_ymd(2019, 1, 1).unwrap();
//!
//! let points = builder.by_entity(Measurement::Genes, &counts, Dimension::Organism, day);
//! assert_eq!(points[0].tag("organism"), Some("homo_sapiens"));
//! ```

pub mod collector;
pub mod config;
pub mod day;
pub mod point;
pub mod sink;
pub mod storage;

pub use collector::{CollectionRun, CollectorError, DailyCollector, DayRange, RangeError, run_range};
pub use config::{ConfigError, DatabaseConfig, MonitorConfig};
pub use day::Day;
pub use point::{Dimension, Measurement, MetricPoint, PointBuilder};
pub use sink::{InfluxConfig, InfluxSink, PointSink, SinkError};
pub use storage::{AggregateQueries, EntityCounts, PgAggregates, PgPool, StorageError};
