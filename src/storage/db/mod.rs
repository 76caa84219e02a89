//! Database connection layer.
//!
//! The annotation store is PostgreSQL. The pool is opened once at process
//! start, shared by reference across all days and queries, and closed
//! explicitly at the end of the run.
//!
//! # Example
//!
//! ```ignore
//! let pool = PgPool::connect("postgres://apollo@localhost/apollo", Duration::from_secs(30)).await?;
//! let row: (i64,) = sqlx::query_as("SELECT 1::bigint").fetch_one(pool.inner()).await?;
//! ```

mod postgres;

pub use postgres::{DEFAULT_CONNECT_TIMEOUT, PgPool};
