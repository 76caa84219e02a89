//! Apollo Monitor Binary Entry Point
//!
//! Collects annotation metrics for today, or for an inclusive date range, and
//! writes them to InfluxDB. Core functionality is provided by the
//! `apollo_monitor` library crate.

use std::time::Duration;

use apollo_monitor::{
    DailyCollector, DatabaseConfig, Day, DayRange, InfluxConfig, InfluxSink, MonitorConfig,
    PgAggregates, PgPool, config::parse_duration, run_range,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Apollo Monitor - collect annotation stats into InfluxDB
#[derive(Parser, Debug)]
#[command(name = "apollo-monitor", version, about, long_about = None)]
struct Cli {
    /// PostgreSQL connection string (supports ${VAR} expansion)
    #[arg(env = "APOLLO_MONITOR_DB")]
    db_string: String,

    /// InfluxDB host
    #[arg(env = "APOLLO_MONITOR_INFLUX_HOST")]
    influx_host: String,

    /// InfluxDB port
    #[arg(env = "APOLLO_MONITOR_INFLUX_PORT")]
    influx_port: u16,

    /// InfluxDB database name (created if missing)
    #[arg(env = "APOLLO_MONITOR_INFLUX_DB")]
    influx_db: String,

    /// Instance label, stored in the `instance` tag
    #[arg(env = "APOLLO_MONITOR_INSTANCE")]
    instance_name: String,

    /// Remove given suffix from user ids
    #[arg(long, default_value = "", env = "APOLLO_MONITOR_SUFFIX")]
    suffix: String,

    /// Collect data from given date (format: YYYYMMDD, e.g. 20181025)
    #[arg(long)]
    from_date: Option<String>,

    /// Collect data until given date (format: YYYYMMDD, e.g. 20181025)
    #[arg(long)]
    to_date: Option<String>,

    /// Do not write any InfluxDB data, just fetch and print stats on stdout
    #[arg(short, long)]
    dry_run: bool,

    /// Measurement name prefix
    #[arg(long, default_value = "apollo", env = "APOLLO_MONITOR_PREFIX")]
    prefix: String,

    /// InfluxDB user (basic auth)
    #[arg(long, env = "APOLLO_MONITOR_INFLUX_USERNAME")]
    influx_username: Option<String>,

    /// InfluxDB password (basic auth)
    #[arg(long, env = "APOLLO_MONITOR_INFLUX_PASSWORD", hide_env_values = true)]
    influx_password: Option<String>,

    /// InfluxDB request timeout (e.g. 10s, 1m)
    #[arg(long, value_parser = parse_duration, default_value = "10s")]
    influx_timeout: Duration,

    /// Database connection timeout (e.g. 30s)
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    db_timeout: Duration,
}

impl Cli {
    fn into_config(self) -> MonitorConfig {
        let mut influx = InfluxConfig::new(self.influx_host, self.influx_port, self.influx_db)
            .with_timeout(self.influx_timeout);
        if let Some(user) = self.influx_username {
            influx = influx.with_credentials(user, self.influx_password);
        }

        let mut database = DatabaseConfig::new(&self.db_string);
        database.connect_timeout = self.db_timeout;

        let mut config = MonitorConfig::new(database, influx, self.instance_name);
        config.user_suffix = self.suffix;
        config.prefix = self.prefix;
        config.dry_run = self.dry_run;
        config.from_date = self.from_date;
        config.to_date = self.to_date;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,apollo_monitor=debug".into()),
        )
        // Logs go to stderr; stdout carries dry-run points
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Cli::parse().into_config();
    config.validate()?;

    // Reject bad ranges before any connection is opened
    let today = Day::today();
    let range = config.day_range(today)?;
    tracing::info!(
        from = %range.start(),
        to = %range.end(),
        days = range.len(),
        "Will run for the following day(s)"
    );

    tracing::info!(
        "Database: {}, InfluxDB: {} ({}), instance: {}",
        config.database.redacted_url(),
        config.influx.base_url(),
        config.influx.database,
        config.instance,
    );

    let pool = PgPool::connect(&config.database.url, config.database.connect_timeout).await?;
    tracing::info!("Connected to annotation database");

    let result = run(&config, &pool, &range, today).await;

    tracing::info!("Closing database connection...");
    pool.close().await;

    result?;
    tracing::info!("Done");
    Ok(())
}

async fn run(
    config: &MonitorConfig,
    pool: &PgPool,
    range: &DayRange,
    today: Day,
) -> Result<(), Box<dyn std::error::Error>> {
    let sink = InfluxSink::new(config.influx.clone())?;
    let collector = DailyCollector::new(
        PgAggregates::new(pool.clone(), config.user_suffix.clone()),
        sink,
        config.point_builder(),
    )
    .with_today(today)
    .with_dry_run(config.dry_run);

    let runs = run_range(&collector, range).await?;
    let points: usize = runs.iter().map(|r| r.points.len()).sum();
    tracing::info!(days = runs.len(), points, "Collection complete");
    Ok(())
}
