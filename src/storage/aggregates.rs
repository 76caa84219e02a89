//! Aggregate queries against an Apollo PostgreSQL schema.
//!
//! Tables used: `organism`, `feature`, `feature_location`, `sequence`,
//! `feature_grails_user` and `grails_user`. Every query is parameterized; the
//! as-of bound is bound as a `timestamp` at midnight of the requested day.

use crate::day::Day;
use crate::storage::db::PgPool;
use crate::storage::normalize::{organism_slug, strip_user_suffix};
use crate::storage::queries::{
    AggregateQueries, EntityCounts, Organism, UserAccount, collect_counts,
};
use crate::storage::StorageError;

/// Feature class identifying gene annotations.
pub const GENE_CLASS: &str = "org.bbop.apollo.Gene";

const ORGANISMS_SQL: &str = "SELECT id, common_name FROM organism ORDER BY id";

const USERS_SQL: &str = "SELECT id, username FROM grails_user ORDER BY id";

const GENES_BY_ORG_SQL: &str = r#"
SELECT o.common_name, COUNT(f.id)
FROM feature f
JOIN feature_location l ON l.feature_id = f.id
JOIN sequence s ON s.id = l.sequence_id
JOIN organism o ON o.id = s.organism_id
WHERE f.class = $1
  AND f.date_created <= $2
GROUP BY o.id, o.common_name
"#;

const USERS_BY_ORG_SQL: &str = r#"
SELECT o.common_name, COUNT(DISTINCT g.user_id)
FROM feature f
JOIN feature_grails_user g ON g.feature_owners_id = f.id
JOIN feature_location l ON l.feature_id = f.id
JOIN sequence s ON s.id = l.sequence_id
JOIN organism o ON o.id = s.organism_id
WHERE f.class = $1
  AND f.date_created <= $2
GROUP BY o.id, o.common_name
"#;

const GENES_BY_USER_SQL: &str = r#"
SELECT u.username, COUNT(f.id)
FROM feature f
JOIN feature_grails_user g ON g.feature_owners_id = f.id
JOIN grails_user u ON u.id = g.user_id
WHERE f.class = $1
  AND f.date_created <= $2
GROUP BY u.username
"#;

/// [`AggregateQueries`] backed by the Apollo PostgreSQL schema.
#[derive(Debug, Clone)]
pub struct PgAggregates {
    pool: PgPool,
    user_suffix: String,
}

impl PgAggregates {
    /// Create aggregates over `pool`, stripping `user_suffix` from usernames.
    pub fn new(pool: PgPool, user_suffix: impl Into<String>) -> Self {
        Self {
            pool,
            user_suffix: user_suffix.into(),
        }
    }

    async fn dated_counts(&self, sql: &str, day: Day) -> Result<Vec<(String, i64)>, StorageError> {
        let rows = sqlx::query_as::<_, (String, i64)>(sql)
            .bind(GENE_CLASS)
            .bind(day.as_of())
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl AggregateQueries for PgAggregates {
    async fn organisms(&self) -> Result<Vec<Organism>, StorageError> {
        let rows = sqlx::query_as::<_, (i64, String)>(ORGANISMS_SQL)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, common_name)| Organism {
                id,
                slug: organism_slug(&common_name),
                common_name,
            })
            .collect())
    }

    async fn users(&self) -> Result<Vec<UserAccount>, StorageError> {
        let rows = sqlx::query_as::<_, (i64, String)>(USERS_SQL)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username)| UserAccount {
                id,
                username: strip_user_suffix(&username, &self.user_suffix).to_string(),
            })
            .collect())
    }

    async fn genes_by_org(&self, day: Day) -> Result<EntityCounts, StorageError> {
        let rows = self.dated_counts(GENES_BY_ORG_SQL, day).await?;
        Ok(collect_counts(
            rows.into_iter().map(|(name, count)| (organism_slug(&name), count)),
        ))
    }

    async fn users_by_org(&self, day: Day) -> Result<EntityCounts, StorageError> {
        let rows = self.dated_counts(USERS_BY_ORG_SQL, day).await?;
        Ok(collect_counts(
            rows.into_iter().map(|(name, count)| (organism_slug(&name), count)),
        ))
    }

    async fn genes_by_user(&self, day: Day) -> Result<EntityCounts, StorageError> {
        let rows = self.dated_counts(GENES_BY_USER_SQL, day).await?;
        Ok(collect_counts(rows.into_iter().map(|(name, count)| {
            (strip_user_suffix(&name, &self.user_suffix).to_string(), count)
        })))
    }
}
