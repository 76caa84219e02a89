//! Aggregate query contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::day::Day;
use crate::storage::StorageError;

/// Count per normalized entity key (organism slug or username), key-ordered.
pub type EntityCounts = BTreeMap<String, i64>;

/// An organism row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organism {
    /// Database ID.
    pub id: i64,
    /// Display name as stored.
    pub common_name: String,
    /// Normalized key used as the `organism` tag.
    pub slug: String,
}

/// A user account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Database ID.
    pub id: i64,
    /// Username with the configured suffix stripped.
    pub username: String,
}

/// Aggregates computed against the annotation store.
///
/// Every dated query counts genes created on or before the midnight of `day`.
/// Queries have no side effects and return an empty mapping when nothing
/// matches.
#[async_trait::async_trait]
pub trait AggregateQueries: Send + Sync {
    /// All organisms. No creation date exists, so only today's count is meaningful.
    async fn organisms(&self) -> Result<Vec<Organism>, StorageError>;

    /// All user accounts. No creation date exists, so only today's count is meaningful.
    async fn users(&self) -> Result<Vec<UserAccount>, StorageError>;

    /// Organism slug to gene count.
    async fn genes_by_org(&self, day: Day) -> Result<EntityCounts, StorageError>;

    /// Organism slug to the number of distinct users owning genes in it.
    async fn users_by_org(&self, day: Day) -> Result<EntityCounts, StorageError>;

    /// Normalized username to the number of genes they own.
    async fn genes_by_user(&self, day: Day) -> Result<EntityCounts, StorageError>;
}

/// Fold `(key, count)` rows into [`EntityCounts`], summing keys that collide
/// after normalization.
pub fn collect_counts<I, K>(rows: I) -> EntityCounts
where
    I: IntoIterator<Item = (K, i64)>,
    K: Into<String>,
{
    let mut counts = EntityCounts::new();
    for (key, count) in rows {
        *counts.entry(key.into()).or_insert(0) += count;
    }
    counts
}
