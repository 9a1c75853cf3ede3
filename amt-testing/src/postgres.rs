use std::env;

use tokio_postgres::{Client, Config, NoTls};

use crate::config::{DataStandard, Engine, HarnessConfig};
use crate::constants;
use crate::constants::env::TEST_POSTGRES_HOST;
use crate::error::{Error, Result};
use crate::harness::TestHarness;

/// Harness for a PostgreSQL-hosted operational database.
///
/// The database itself is assumed to exist with its schema deployed;
/// preparing it means truncating every table the superuser role owns in
/// the managed schemas. The table list is discovered from `pg_tables` at
/// call time so it tracks schema evolution without hardcoding.
pub struct PostgresHarness {
	config: HarnessConfig,
}

/// Builds one `TRUNCATE TABLE ... CASCADE` statement covering all managed
/// tables. The aggregation happens server side; when no tables match, the
/// aggregate (and thus the whole scalar) is NULL.
fn truncate_discovery_sql() -> String {
	format!(
		"SELECT 'TRUNCATE TABLE ' \
			|| string_agg(format('%I.%I', schemaname, tablename), ', ') \
			|| ' CASCADE' \
		FROM pg_tables \
		WHERE tableowner = '{}' AND (schemaname = '{}' OR schemaname = '{}')",
		constants::POSTGRES_SUPERUSER,
		constants::OPERATIONAL_SCHEMA,
		constants::ANALYTICS_CONFIG_SCHEMA,
	)
}

impl PostgresHarness {
	pub fn new(data_standard: DataStandard) -> PostgresHarness {
		PostgresHarness::with_config(HarnessConfig::postgres(data_standard))
	}

	pub fn with_config(config: HarnessConfig) -> PostgresHarness {
		debug_assert_eq!(config.engine, Engine::Postgres);
		PostgresHarness { config }
	}

	fn host() -> String {
		env::var(TEST_POSTGRES_HOST).unwrap_or_else(|_| constants::DEFAULT_HOST.to_string())
	}
}

impl TestHarness for PostgresHarness {
	type Connection = Client;

	fn config(&self) -> &HarnessConfig {
		&self.config
	}

	async fn open_connection(&self) -> Result<Client> {
		let mut config = Config::new();
		config.user(constants::POSTGRES_SUPERUSER);
		config.host(&PostgresHarness::host());
		config.port(constants::POSTGRES_PORT);
		config.dbname(&self.config.database_name);

		let (client, connection) = config.connect(NoTls).await
			.map_err(|e| Error::connection(&self.config.database_name, e))?;
		tokio::spawn(async move {
			if let Err(e) = connection.await {
				error!("postgres connection error: {}", e);
			}
		});

		Ok(client)
	}

	async fn prepare_database(&self) -> Result<()> {
		self.uninstall().await?;

		let client = self.open_connection().await?;
		let row = client.query_one(&truncate_discovery_sql(), &[]).await
			.map_err(Error::query)?;

		match row.get::<_, Option<String>>(0) {
			Some(truncate_all_tables) if !truncate_all_tables.is_empty() => {
				debug!("resetting {}: {}", self.config.database_name, truncate_all_tables);
				client.batch_execute(&truncate_all_tables).await.map_err(Error::query)?;
			},
			// no managed tables means nothing to reset
			_ => info!("no tables to truncate in {}", self.config.database_name),
		}

		Ok(())
	}
}
