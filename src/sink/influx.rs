//! InfluxDB 1.x HTTP sink.
//!
//! Writes line protocol to `/write` and bootstraps the target database through
//! `/query` (`SHOW DATABASES`, then `CREATE DATABASE` when absent). The
//! bootstrap runs once, on the first write, and is memoized for the process.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::point::MetricPoint;
use crate::sink::line_protocol::encode_batch;
use crate::sink::{PointSink, SinkError};

/// Default request timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default InfluxDB HTTP port.
pub const DEFAULT_PORT: u16 = 8086;

/// Connection settings for the InfluxDB HTTP API.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Host name or address, optionally with an `http://`/`https://` scheme.
    pub host: String,
    /// HTTP API port.
    pub port: u16,
    /// Target database.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl InfluxConfig {
    /// Create a configuration with no credentials and the default timeout.
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set basic-auth credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the HTTP API, e.g. `http://localhost:8086`.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.contains("://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// [`PointSink`] writing to an InfluxDB 1.x server.
pub struct InfluxSink {
    config: InfluxConfig,
    client: Client,
    bootstrapped: OnceCell<()>,
}

impl std::fmt::Debug for InfluxSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxSink")
            .field("url", &self.config.base_url())
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

impl InfluxSink {
    /// Build the sink. No request is made until the first write.
    pub fn new(config: InfluxConfig) -> Result<Self, SinkError> {
        if config.database.trim().is_empty() {
            return Err(SinkError::Config("database name is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("apollo-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            client,
            bootstrapped: OnceCell::new(),
        })
    }

    /// Create the target database if it does not exist yet. Idempotent.
    pub async fn ensure_database(&self) -> Result<(), SinkError> {
        self.bootstrapped
            .get_or_try_init(|| self.bootstrap())
            .await?;
        Ok(())
    }

    /// Names of the databases present on the server.
    pub async fn list_databases(&self) -> Result<Vec<String>, SinkError> {
        let request = self
            .authorize(self.client.get(self.url("query")))
            .query(&[("q", "SHOW DATABASES")]);
        let response = check_status(request.send().await?).await?;
        let body: QueryResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(SinkError::Query(error));
        }

        let mut names = Vec::new();
        for statement in body.results {
            if let Some(error) = statement.error {
                return Err(SinkError::Query(error));
            }
            for series in statement.series {
                names.extend(
                    series
                        .values
                        .iter()
                        .filter_map(|row| row.first()?.as_str().map(str::to_string)),
                );
            }
        }
        Ok(names)
    }

    async fn bootstrap(&self) -> Result<(), SinkError> {
        let database = &self.config.database;
        let existing = self.list_databases().await?;

        if existing.iter().any(|name| name == database) {
            tracing::debug!(database = %database, "InfluxDB database exists");
            return Ok(());
        }

        tracing::info!(database = %database, "Creating InfluxDB database");
        let statement = format!("CREATE DATABASE \"{}\"", quote_identifier(database));
        let request = self
            .authorize(self.client.post(self.url("query")))
            .form(&[("q", statement.as_str())]);
        let response = check_status(request.send().await?).await?;
        let body: QueryResponse = response.json().await?;

        match body
            .error
            .or_else(|| body.results.into_iter().find_map(|r| r.error))
        {
            Some(error) => Err(SinkError::Query(error)),
            None => Ok(()),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url(), endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_deref()),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl PointSink for InfluxSink {
    async fn write_points(&self, points: &[MetricPoint]) -> Result<(), SinkError> {
        if points.is_empty() {
            tracing::debug!("No points to write");
            return Ok(());
        }

        self.ensure_database().await?;

        let request = self
            .authorize(self.client.post(self.url("write")))
            .query(&[
                ("db", self.config.database.as_str()),
                ("precision", "ns"),
            ])
            .body(encode_batch(points));
        check_status(request.send().await?).await?;

        tracing::debug!(
            database = %self.config.database,
            points = points.len(),
            "Wrote points to InfluxDB"
        );
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Rejected {
        status: status.as_u16(),
        body,
    })
}

fn quote_identifier(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_influx_config_defaults() {
        let config = InfluxConfig::new("localhost", DEFAULT_PORT, "apollo");
        assert_eq!(config.base_url(), "http://localhost:8086");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_base_url_keeps_scheme() {
        let config = InfluxConfig::new("https://influx.example.org/", 443, "apollo");
        assert_eq!(config.base_url(), "https://influx.example.org:443");
    }

    #[test]
    fn test_new_rejects_empty_database() {
        let err = InfluxSink::new(InfluxConfig::new("localhost", 8086, " ")).unwrap_err();
        assert!(matches!(err, SinkError::Config(_)));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("apollo"), "apollo");
        assert_eq!(quote_identifier(r#"a"b"#), r#"a\"b"#);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        // Nothing listens on this port; an attempted request would fail.
        let sink = InfluxSink::new(
            InfluxConfig::new("127.0.0.1", 1, "apollo").with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        sink.write_points(&[]).await.unwrap();
    }
}
