//! Collector Layer
//!
//! Turns per-day aggregate results into a batch of points and hands the batch
//! to a sink, one day at a time.
//!
//! # Architecture
//!
//! - [`DailyCollector`]: runs the aggregates for one day, builds its points, writes or prints them
//! - [`DayRange`]: validated, inclusive, ascending range of days
//! - [`run_range`]: drives the collector over a range, aborting on the first failed day
//!
//! # Example
//!
//! ```rust,no_run
//! use apollo_monitor::{
//!     DailyCollector, DayRange, Day, InfluxConfig, InfluxSink, PgAggregates, PgPool,
//!     PointBuilder, run_range,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgres://apollo@localhost/apollo", Duration::from_secs(30)).await?;
//! let sink = InfluxSink::new(InfluxConfig::new("localhost", 8086, "apollo"))?;
//! let collector = DailyCollector::new(
//!     PgAggregates::new(pool.clone(), "@example.org"),
//!     sink,
//!     PointBuilder::new("apollo", "main"),
//! );
//! run_range(&collector, &DayRange::single(Day::today())).await?;
//! pool.close().await;
//! # Ok(())
//! # }
//! ```

mod daily;
mod error;
mod range;

pub use daily::{CollectionRun, DailyCollector};
pub use error::CollectorError;
pub use range::{DayRange, RangeError, run_range};
