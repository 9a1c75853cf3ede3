//! Live-server tests for the PostgreSQL harness.
//!
//! These need a running server; they are skipped unless
//! `TEST_POSTGRES_HOST` points at one. The harness assumes the target
//! database already exists, so each test ensures that through the
//! maintenance database first.

use amt_testing::constants::env::TEST_POSTGRES_HOST;
use amt_testing::{DataStandard, Engine, HarnessConfig, PostgresHarness, TestHarness};

fn postgres_available() -> bool {
	std::env::var(TEST_POSTGRES_HOST).is_ok()
}

fn maintenance_config() -> HarnessConfig {
	HarnessConfig {
		engine: Engine::Postgres,
		data_standard: DataStandard::Ds32,
		database_name: "postgres".to_string(),
		schema_artifact: None,
	}
}

async fn ensure_database(name: &str) {
	let maintenance = PostgresHarness::with_config(maintenance_config());
	let client = maintenance.open_connection().await
		.expect("connected to the maintenance database");

	let exists = client
		.query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&name]).await
		.expect("catalog query succeeded")
		.is_some();
	if !exists {
		client.execute(&format!("CREATE DATABASE \"{}\"", name), &[]).await
			.expect("test database created");
	}
}

#[tokio::test]
async fn repeated_prepare_truncates_but_keeps_structure() {
	if !postgres_available() {
		return;
	}
	amt_testing::util::init_logging().expect("logging can be initialized");

	let harness = PostgresHarness::new(DataStandard::Ds32);
	ensure_database(&harness.config().database_name).await;

	let client = harness.open_connection().await.expect("connection opened");
	client.batch_execute(
		"CREATE SCHEMA IF NOT EXISTS edfi; \
		CREATE SCHEMA IF NOT EXISTS analytics_config; \
		CREATE TABLE IF NOT EXISTS edfi.harness_probe (id int PRIMARY KEY); \
		CREATE TABLE IF NOT EXISTS analytics_config.harness_probe \
			(id int REFERENCES edfi.harness_probe (id));",
	).await.expect("schema objects created");
	client.batch_execute(
		"INSERT INTO edfi.harness_probe VALUES (1) ON CONFLICT DO NOTHING; \
		INSERT INTO analytics_config.harness_probe VALUES (1);",
	).await.expect("rows seeded");

	harness.prepare_database().await.expect("prepare succeeded");

	// the foreign key forces the CASCADE path; both tables must survive empty
	let client = harness.open_connection().await.expect("connection reopened");
	let rows: i64 = client
		.query_one("SELECT count(*) FROM edfi.harness_probe", &[]).await
		.expect("operational table still exists")
		.get(0);
	assert_eq!(rows, 0);
	let rows: i64 = client
		.query_one("SELECT count(*) FROM analytics_config.harness_probe", &[]).await
		.expect("config table still exists")
		.get(0);
	assert_eq!(rows, 0);

	harness.prepare_database().await.expect("prepare is idempotent");
}

#[tokio::test]
async fn prepare_skips_truncate_when_no_managed_tables_exist() {
	if !postgres_available() {
		return;
	}
	amt_testing::util::init_logging().expect("logging can be initialized");

	let database = "amt_harness_empty";
	ensure_database(database).await;

	let harness = PostgresHarness::with_config(HarnessConfig {
		engine: Engine::Postgres,
		data_standard: DataStandard::Ds32,
		database_name: database.to_string(),
		schema_artifact: None,
	});
	harness.prepare_database().await.expect("prepare succeeds with nothing to truncate");
}
