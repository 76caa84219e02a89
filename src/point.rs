//! Time-series point construction.
//!
//! Turns aggregate results into [`MetricPoint`]s. Pure transformation, no I/O.
//!
//! Every point carries an `instance` tag; points built from an entity mapping
//! carry one extra [`Dimension`] tag whose value is the entity key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::day::Day;
use crate::storage::EntityCounts;

/// Default measurement prefix (`apollo.genes`, `apollo.users`, ...).
pub const DEFAULT_PREFIX: &str = "apollo";

/// Tag carrying the configured instance label.
pub const INSTANCE_TAG: &str = "instance";

/// Measurements emitted by the collector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Measurement {
    /// Total organisms.
    Organisms,
    /// Gene counts (total, by organism, by user).
    Genes,
    /// User counts (total, by organism).
    Users,
    /// Users owning at least one gene.
    UsersActive,
}

/// Extra tag dimension for per-entity points.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    /// Organism slug.
    Organism,
    /// Normalized username.
    User,
}

/// Field set of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFields {
    /// The counted value.
    pub value: i64,
}

/// One time-stamped, tagged measurement sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Prefixed measurement name (e.g. `apollo.genes`).
    pub measurement: String,
    /// Nanoseconds since the Unix epoch.
    #[serde(rename = "time")]
    pub timestamp: i64,
    /// Tags, always including `instance`.
    pub tags: BTreeMap<String, String>,
    /// Fields.
    pub fields: PointFields,
}

impl MetricPoint {
    /// Tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Shorthand for `fields.value`.
    pub fn value(&self) -> i64 {
        self.fields.value
    }
}

/// Builds points for one instance under one measurement prefix.
#[derive(Debug, Clone)]
pub struct PointBuilder {
    prefix: String,
    instance: String,
}

impl PointBuilder {
    /// Create a builder tagging every point with `instance`.
    pub fn new(prefix: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            instance: instance.into(),
        }
    }

    /// The instance label.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Full measurement name for `measurement`.
    pub fn measurement_name(&self, measurement: Measurement) -> String {
        format!("{}.{}", self.prefix, measurement)
    }

    /// One point tagged with the instance only.
    pub fn single(&self, measurement: Measurement, value: i64, day: Day) -> MetricPoint {
        MetricPoint {
            measurement: self.measurement_name(measurement),
            timestamp: day.timestamp_nanos(),
            tags: self.base_tags(),
            fields: PointFields { value },
        }
    }

    /// One point per entity, tagged with `{dimension: key}`, in key order.
    ///
    /// Entities with an empty key are skipped: an empty tag value cannot be
    /// written.
    pub fn by_entity(
        &self,
        measurement: Measurement,
        counts: &EntityCounts,
        dimension: Dimension,
        day: Day,
    ) -> Vec<MetricPoint> {
        let name = self.measurement_name(measurement);
        let timestamp = day.timestamp_nanos();

        counts
            .iter()
            .filter(|(key, value)| {
                if key.is_empty() {
                    tracing::warn!(
                        measurement = %name,
                        dimension = %dimension,
                        value = **value,
                        "Skipping entity with empty key"
                    );
                    return false;
                }
                true
            })
            .map(|(key, &value)| {
                let mut tags = self.base_tags();
                tags.insert(dimension.to_string(), key.clone());
                MetricPoint {
                    measurement: name.clone(),
                    timestamp,
                    tags,
                    fields: PointFields { value },
                }
            })
            .collect()
    }

    fn base_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(INSTANCE_TAG.to_string(), self.instance.clone())])
    }
}
