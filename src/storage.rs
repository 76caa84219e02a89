//! Aggregate Queries
//!
//! Read-only access to the Apollo annotation store:
//! - **Contract**: [`AggregateQueries`], one method per aggregate, parameterized by [`Day`](crate::Day)
//! - **Backend**: [`PgAggregates`] over a single-connection [`PgPool`]
//! - **Keys**: organism slugs and suffix-stripped usernames via [`organism_slug`] / [`strip_user_suffix`]

mod aggregates;
pub mod db;
mod error;
mod normalize;
mod queries;

pub use aggregates::{GENE_CLASS, PgAggregates};
pub use db::PgPool;
pub use error::StorageError;
pub use normalize::{organism_slug, strip_user_suffix};
pub use queries::{AggregateQueries, EntityCounts, Organism, UserAccount, collect_counts};
