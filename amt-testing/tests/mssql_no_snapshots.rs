//! Disabled-snapshot behavior for the SQL Server harness.
//!
//! Lives in its own test binary because it mutates the process
//! environment, which must not race the snapshot-enabled tests.

use amt_testing::constants::env::{ANALYTICSMIDDLETIER_NO_SNAPSHOTS, TEST_MSSQL_HOST};
use amt_testing::{DataStandard, SqlServerHarness, TestHarness};

const SCHEMA_ARTIFACT: &str = "\
CREATE SCHEMA edfi\n\
GO\n\
CREATE TABLE edfi.harness_probe (id int PRIMARY KEY)\n\
GO\n";

#[tokio::test]
async fn disabled_snapshots_force_a_full_rebuild_every_run() {
	if std::env::var(TEST_MSSQL_HOST).is_err() {
		return;
	}
	amt_testing::util::init_logging().expect("logging can be initialized");
	std::env::set_var(ANALYTICSMIDDLETIER_NO_SNAPSHOTS, "true");

	let harness = SqlServerHarness::new(DataStandard::Ds2);
	let artifact = harness.config().schema_artifact.clone()
		.expect("sql server harness has a schema artifact");
	let exe = std::env::current_exe().expect("test binary path");
	std::fs::write(exe.parent().expect("test binary directory").join(artifact), SCHEMA_ARTIFACT)
		.expect("artifact written");

	harness.prepare_database().await.expect("first prepare rebuilds");

	let mut conn = harness.open_connection().await.expect("connection opened");
	conn.execute("INSERT INTO edfi.harness_probe VALUES (1)", &[]).await
		.expect("row seeded");
	conn.close().await.expect("connection closed");

	// no snapshot is ever captured in this mode, so the reset is another
	// full deploy and the seeded row is gone
	harness.prepare_database().await.expect("second prepare rebuilds again");

	let mut conn = harness.open_connection().await.expect("connection reopened");
	let rows = conn
		.query("SELECT id FROM edfi.harness_probe", &[]).await
		.expect("probe table exists after the rebuild")
		.collect_all().await
		.expect("rows read");
	assert!(rows.is_empty());
	conn.close().await.expect("connection closed");
}
