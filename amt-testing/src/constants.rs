/// The PostgreSQL role that owns every table the harness resets.
pub const POSTGRES_SUPERUSER: &str = "postgres";

/// The operational schema the analytics layer is built on.
pub const OPERATIONAL_SCHEMA: &str = "edfi";

/// The schema holding analytics configuration tables.
pub const ANALYTICS_CONFIG_SCHEMA: &str = "analytics_config";

pub const DEFAULT_HOST: &str = "localhost";
pub const POSTGRES_PORT: u16 = 5432;
pub const MSSQL_PORT: u16 = 1433;

pub mod env {
	/// Set to "true" to disable the SQL Server snapshot fast-path and
	/// force a full schema rebuild on every run.
	pub const ANALYTICSMIDDLETIER_NO_SNAPSHOTS: &str = "ANALYTICSMIDDLETIER_NO_SNAPSHOTS";
	/// Hostname of the PostgreSQL server used by the integration tests.
	pub const TEST_POSTGRES_HOST: &str = "TEST_POSTGRES_HOST";
	/// Hostname of the SQL Server instance used by the integration tests.
	pub const TEST_MSSQL_HOST: &str = "TEST_MSSQL_HOST";
}
