//! Per-day collection: run the aggregates, build the points, write or print.

use crate::collector::CollectorError;
use crate::day::Day;
use crate::point::{Dimension, Measurement, MetricPoint, PointBuilder};
use crate::sink::PointSink;
use crate::storage::{AggregateQueries, StorageError};

/// Points produced for one day.
#[derive(Debug, Clone)]
pub struct CollectionRun {
    /// Collected day.
    pub day: Day,
    /// Points in emission order.
    pub points: Vec<MetricPoint>,
    /// Whether the batch was handed to the sink.
    pub written: bool,
}

impl CollectionRun {
    /// Points of `measurement` (full name) without an extra dimension tag.
    pub fn totals<'a>(&'a self, measurement: &'a str) -> impl Iterator<Item = &'a MetricPoint> {
        self.points
            .iter()
            .filter(move |p| p.measurement == measurement && p.tags.len() == 1)
    }
}

/// Runs the aggregate queries for a day and forwards the resulting points.
///
/// Organism and user totals are only emitted when the day is today: the
/// store has no creation date for those rows, so past totals cannot be
/// reconstructed.
pub struct DailyCollector<Q, S> {
    queries: Q,
    sink: S,
    points: PointBuilder,
    today: Day,
    dry_run: bool,
}

impl<Q, S> std::fmt::Debug for DailyCollector<Q, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyCollector")
            .field("points", &self.points)
            .field("today", &self.today)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<Q, S> DailyCollector<Q, S>
where
    Q: AggregateQueries,
    S: PointSink,
{
    /// Create a collector writing to `sink`, with today taken from the UTC clock.
    pub fn new(queries: Q, sink: S, points: PointBuilder) -> Self {
        Self {
            queries,
            sink,
            points,
            today: Day::today(),
            dry_run: false,
        }
    }

    /// Print points instead of writing them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Override the day treated as today.
    pub fn with_today(mut self, today: Day) -> Self {
        self.today = today;
        self
    }

    /// Day treated as today.
    pub fn today(&self) -> Day {
        self.today
    }

    /// The aggregate source.
    pub fn queries(&self) -> &Q {
        &self.queries
    }

    /// Collect `day` and write (or print) its points as a single batch.
    ///
    /// Any query failure aborts the day before anything is written.
    pub async fn collect(&self, day: Day) -> Result<CollectionRun, CollectorError> {
        tracing::info!(day = %day, "Collecting stats");

        let points = self
            .gather(day)
            .await
            .map_err(|source| CollectorError::Query { day, source })?;

        if self.dry_run {
            report(&points);
            tracing::info!(day = %day, points = points.len(), "Not writing points (dry-run mode)");
            return Ok(CollectionRun {
                day,
                points,
                written: false,
            });
        }

        tracing::info!(day = %day, points = points.len(), "Writing points");
        self.sink
            .write_points(&points)
            .await
            .map_err(|source| CollectorError::Sink { day, source })?;

        Ok(CollectionRun {
            day,
            points,
            written: true,
        })
    }

    /// Run the aggregates for `day` and build its points, in emission order.
    pub async fn gather(&self, day: Day) -> Result<Vec<MetricPoint>, StorageError> {
        let is_today = day == self.today;
        let builder = &self.points;

        let genes_by_org = self.queries.genes_by_org(day).await?;
        tracing::debug!(day = %day, ?genes_by_org, "Genes by organism");

        let users_by_org = self.queries.users_by_org(day).await?;
        tracing::debug!(day = %day, ?users_by_org, "Users by organism");

        let genes_by_user = self.queries.genes_by_user(day).await?;
        tracing::debug!(day = %day, ?genes_by_user, "Genes by user");

        let (organisms_total, users_total) = if is_today {
            let organisms = self.queries.organisms().await?;
            let users = self.queries.users().await?;
            tracing::info!(
                day = %day,
                organisms = organisms.len(),
                users = users.len(),
                active_users = genes_by_user.len(),
                "Found today's totals"
            );
            (
                Some(builder.single(Measurement::Organisms, organisms.len() as i64, day)),
                Some(builder.single(Measurement::Users, users.len() as i64, day)),
            )
        } else {
            (None, None)
        };

        let total_genes: i64 = genes_by_org.values().sum();

        let mut points = Vec::with_capacity(
            4 + genes_by_org.len() + users_by_org.len() + genes_by_user.len(),
        );
        points.extend(organisms_total);
        points.push(builder.single(Measurement::Genes, total_genes, day));
        points.extend(builder.by_entity(
            Measurement::Genes,
            &genes_by_org,
            Dimension::Organism,
            day,
        ));
        points.extend(builder.by_entity(
            Measurement::Users,
            &users_by_org,
            Dimension::Organism,
            day,
        ));
        points.extend(users_total);
        points.push(builder.single(
            Measurement::UsersActive,
            genes_by_user.len() as i64,
            day,
        ));
        points.extend(builder.by_entity(
            Measurement::Genes,
            &genes_by_user,
            Dimension::User,
            day,
        ));

        Ok(points)
    }
}

/// Print each point as one JSON object per line on stdout.
fn report(points: &[MetricPoint]) {
    for point in points {
        match serde_json::to_string(point) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "Failed to render point"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use crate::storage::{EntityCounts, Organism, UserAccount};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeStore {
        genes_by_org: EntityCounts,
        users_by_org: EntityCounts,
        genes_by_user: EntityCounts,
        organisms: usize,
        users: usize,
        fail_genes_by_user: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeStore {
        fn sample() -> Self {
            Self {
                genes_by_org: EntityCounts::from([
                    ("org_a".to_string(), 3),
                    ("org_b".to_string(), 5),
                ]),
                users_by_org: EntityCounts::from([
                    ("org_a".to_string(), 1),
                    ("org_b".to_string(), 2),
                ]),
                genes_by_user: EntityCounts::from([
                    ("alice".to_string(), 6),
                    ("bob".to_string(), 2),
                ]),
                organisms: 3,
                users: 4,
                ..Default::default()
            }
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }
    }

    #[async_trait::async_trait]
    impl AggregateQueries for FakeStore {
        async fn organisms(&self) -> Result<Vec<Organism>, StorageError> {
            self.record("organisms");
            Ok((0..self.organisms)
                .map(|i| Organism {
                    id: i as i64,
                    common_name: format!("Org {i}"),
                    slug: format!("org_{i}"),
                })
                .collect())
        }

        async fn users(&self) -> Result<Vec<UserAccount>, StorageError> {
            self.record("users");
            Ok((0..self.users)
                .map(|i| UserAccount {
                    id: i as i64,
                    username: format!("user{i}"),
                })
                .collect())
        }

        async fn genes_by_org(&self, _day: Day) -> Result<EntityCounts, StorageError> {
            self.record("genes_by_org");
            Ok(self.genes_by_org.clone())
        }

        async fn users_by_org(&self, _day: Day) -> Result<EntityCounts, StorageError> {
            self.record("users_by_org");
            Ok(self.users_by_org.clone())
        }

        async fn genes_by_user(&self, _day: Day) -> Result<EntityCounts, StorageError> {
            self.record("genes_by_user");
            if self.fail_genes_by_user {
                return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.genes_by_user.clone())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingSink {
        writes: Arc<AtomicUsize>,
        points: Arc<Mutex<Vec<MetricPoint>>>,
    }

    #[async_trait::async_trait]
    impl PointSink for RecordingSink {
        async fn write_points(&self, points: &[MetricPoint]) -> Result<(), SinkError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.points.lock().unwrap().extend_from_slice(points);
            Ok(())
        }
    }

    fn today() -> Day {
        Day::from_ymd(2024, 6, 1).unwrap()
    }

    fn yesterday() -> Day {
        Day::from_ymd(2024, 5, 31).unwrap()
    }

    fn collector(store: FakeStore, sink: RecordingSink) -> DailyCollector<FakeStore, RecordingSink> {
        DailyCollector::new(store, sink, PointBuilder::new("apollo", "main")).with_today(today())
    }

    #[tokio::test]
    async fn test_today_emits_totals_in_order() {
        let sink = RecordingSink::default();
        let run = collector(FakeStore::sample(), sink.clone())
            .collect(today())
            .await
            .unwrap();

        let names: Vec<_> = run.points.iter().map(|p| p.measurement.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "apollo.organisms",
                "apollo.genes",
                "apollo.genes",
                "apollo.genes",
                "apollo.users",
                "apollo.users",
                "apollo.users",
                "apollo.users_active",
                "apollo.genes",
                "apollo.genes",
            ]
        );
        assert_eq!(run.points[0].value(), 3);
        assert_eq!(run.points[4].tag("organism"), Some("org_a"));
        assert_eq!(run.points[6].tags.len(), 1);
        assert_eq!(run.points[6].value(), 4);
        assert!(run.written);
        assert_eq!(sink.writes.load(Ordering::SeqCst), 1);
        assert_eq!(sink.points.lock().unwrap().len(), run.points.len());
    }

    #[tokio::test]
    async fn test_past_day_has_no_totals() {
        let collector = collector(FakeStore::sample(), RecordingSink::default());
        let run = collector.collect(yesterday()).await.unwrap();

        assert_eq!(run.totals("apollo.organisms").count(), 0);
        assert_eq!(run.totals("apollo.users").count(), 0);
        let calls = collector.queries().calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["genes_by_org", "users_by_org", "genes_by_user"]);
    }

    #[tokio::test]
    async fn test_totals_are_consistent() {
        let run = collector(FakeStore::sample(), RecordingSink::default())
            .collect(today())
            .await
            .unwrap();

        let genes: Vec<_> = run.totals("apollo.genes").collect();
        assert_eq!(genes.len(), 1);
        assert_eq!(genes[0].value(), 8);

        let active: Vec<_> = run.totals("apollo.users_active").collect();
        assert_eq!(active[0].value(), 2);

        let by_user: Vec<_> = run.points.iter().filter(|p| p.tag("user").is_some()).collect();
        assert_eq!(by_user.len(), 2);
        assert_eq!(by_user[0].tag("user"), Some("alice"));
        assert_eq!(by_user[0].value(), 6);
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let sink = RecordingSink::default();
        let collector = collector(FakeStore::sample(), sink.clone()).with_dry_run(true);

        for day in [yesterday(), today()] {
            let run = collector.collect(day).await.unwrap();
            assert!(!run.written);
            assert!(!run.points.is_empty());
        }
        assert_eq!(sink.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_failure_aborts_without_write() {
        let sink = RecordingSink::default();
        let store = FakeStore {
            fail_genes_by_user: true,
            ..FakeStore::sample()
        };
        let err = collector(store, sink.clone()).collect(today()).await.unwrap_err();

        assert!(matches!(err, CollectorError::Query { .. }));
        assert_eq!(err.day(), today());
        assert_eq!(sink.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_store_yields_zero_totals() {
        let run = collector(FakeStore::default(), RecordingSink::default())
            .collect(today())
            .await
            .unwrap();

        let values: Vec<_> = run.points.iter().map(|p| (p.measurement.as_str(), p.value())).collect();
        assert_eq!(
            values,
            vec![
                ("apollo.organisms", 0),
                ("apollo.genes", 0),
                ("apollo.users", 0),
                ("apollo.users_active", 0),
            ]
        );
    }
}
