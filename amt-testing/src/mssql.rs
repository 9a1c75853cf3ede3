use std::env;
use std::path::PathBuf;

use mssql_client::{Client, Config, Credentials, Ready};

use crate::config::{DataStandard, Engine, HarnessConfig};
use crate::constants;
use crate::constants::env::{ANALYTICSMIDDLETIER_NO_SNAPSHOTS, TEST_MSSQL_HOST};
use crate::error::{Error, Result};
use crate::harness::TestHarness;

const MASTER_DATABASE: &str = "master";

/// Harness for a SQL Server-hosted operational database.
///
/// Preparing the database takes one of two paths. The slow path deploys
/// the versioned schema artifact from scratch, dropping and recreating
/// the target database. The fast path restores a server-side snapshot
/// captured right after the first deploy, which makes every reset after
/// the first O(restore) instead of O(deploy).
///
/// All orchestration runs against a `master` connection; the restore
/// forces the target into single-user mode precisely because no other
/// connection may be open while it happens.
pub struct SqlServerHarness {
	config: HarnessConfig,
}

/// How `prepare_database` will bring the target to a clean state,
/// decided once from the environment and the live server catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreparePlan {
	/// Snapshot reuse is disabled: deploy the schema artifact, dropping
	/// a leftover snapshot first when one exists.
	Rebuild { drop_stale_snapshot: bool },
	/// Database and snapshot both exist: roll back to the snapshot.
	RestoreSnapshot,
	/// First run, or the database vanished: deploy the artifact, then
	/// capture the snapshot later runs will restore from.
	RebuildAndSnapshot,
}

impl PreparePlan {
	fn determine(no_snapshots: bool, database_exists: bool, snapshot_exists: bool) -> PreparePlan {
		if no_snapshots {
			PreparePlan::Rebuild { drop_stale_snapshot: snapshot_exists }
		} else if database_exists && snapshot_exists {
			PreparePlan::RestoreSnapshot
		} else {
			// never restore into a database that is not there
			PreparePlan::RebuildAndSnapshot
		}
	}
}

fn no_snapshots() -> bool {
	match env::var(ANALYTICSMIDDLETIER_NO_SNAPSHOTS) {
		Ok(value) => parse_no_snapshots(&value),
		Err(_) => false,
	}
}

/// Unset or unparseable values leave the snapshot fast-path enabled.
fn parse_no_snapshots(value: &str) -> bool {
	value.trim().to_ascii_lowercase().parse::<bool>().unwrap_or(false)
}

/// Splits a schema artifact script into the batches SQL Server expects.
/// `GO` is a client-side separator, not T-SQL, so it must never be sent
/// to the server.
fn split_batches(script: &str) -> Vec<String> {
	let mut batches = Vec::new();
	let mut current = String::new();
	for line in script.lines() {
		if line.trim().eq_ignore_ascii_case("GO") {
			if !current.trim().is_empty() {
				batches.push(current.trim_end().to_string());
			}
			current.clear();
		} else {
			current.push_str(line);
			current.push('\n');
		}
	}
	if !current.trim().is_empty() {
		batches.push(current.trim_end().to_string());
	}
	batches
}

/// Physical path of the primary data file, with the file name stripped so
/// the snapshot file can be placed next to it.
fn primary_file_path_query(database: &str) -> String {
	format!(
		"WITH pathname AS (\n\
		    SELECT [physical_name]\n\
		    FROM [{database}].[sys].[database_files]\n\
		    WHERE [type_desc] = 'ROWS'\n\
		)\n\
		SELECT REPLACE([physical_name], '{database}_Primary.mdf', '') AS FilePath\n\
		FROM pathname"
	)
}

fn create_snapshot_statement(database: &str, snapshot: &str, file_path: &str) -> String {
	format!(
		"CREATE DATABASE [{snapshot}] ON\n\
		  (NAME = [{database}], FILENAME = '{file_path}{snapshot}.ss')\n\
		AS SNAPSHOT OF [{database}]"
	)
}

fn restore_statements(database: &str, snapshot: &str) -> [String; 3] {
	[
		format!("ALTER DATABASE [{database}] SET SINGLE_USER WITH ROLLBACK IMMEDIATE"),
		format!(
			"IF EXISTS (SELECT 1 FROM sys.databases WHERE [name] = '{snapshot}')\n\
			BEGIN\n\
			    RESTORE DATABASE [{database}] FROM DATABASE_SNAPSHOT = '{snapshot}'\n\
			END"
		),
		format!("ALTER DATABASE [{database}] SET MULTI_USER"),
	]
}

impl SqlServerHarness {
	pub fn new(data_standard: DataStandard) -> SqlServerHarness {
		SqlServerHarness::with_config(HarnessConfig::sql_server(data_standard))
	}

	pub fn with_config(config: HarnessConfig) -> SqlServerHarness {
		debug_assert_eq!(config.engine, Engine::SqlServer);
		SqlServerHarness { config }
	}

	fn host() -> String {
		env::var(TEST_MSSQL_HOST).unwrap_or_else(|_| constants::DEFAULT_HOST.to_string())
	}

	fn client_config(database: &str) -> Config {
		Config::new()
			.host(SqlServerHarness::host())
			.port(constants::MSSQL_PORT)
			.database(database)
			.credentials(Credentials::Integrated)
			.trust_server_certificate(true)
	}

	async fn connect_to(&self, database: &str) -> Result<Client<Ready>> {
		Client::connect(SqlServerHarness::client_config(database)).await
			.map_err(|e| Error::connection(database, e))
	}

	async fn master_client(&self) -> Result<Client<Ready>> {
		self.connect_to(MASTER_DATABASE).await
	}

	/// Live probe of the server catalog; never cached.
	async fn catalog_database_exists(&self, master: &mut Client<Ready>, name: &str) -> Result<bool> {
		let rows = master
			.query("SELECT 1 FROM sys.databases WHERE [name] = @p1", &[&name]).await
			.map_err(Error::query)?
			.collect_all().await
			.map_err(Error::query)?;
		Ok(!rows.is_empty())
	}

	fn schema_artifact_name(&self) -> Result<&str> {
		self.config.schema_artifact.as_deref().ok_or_else(|| {
			Error::deployment(&self.config.database_name, "no schema artifact configured for this harness")
		})
	}

	/// The schema artifact ships next to the running test binary, named
	/// per data-standard version.
	fn schema_artifact_path(&self) -> Result<PathBuf> {
		let artifact = self.schema_artifact_name()?;
		let exe = env::current_exe().map_err(|e| Error::deployment(artifact, e))?;
		let dir = exe.parent()
			.ok_or_else(|| Error::deployment(artifact, "test binary has no parent directory"))?;
		Ok(dir.join(artifact))
	}

	/// Deploys the schema artifact with drop-and-recreate semantics: the
	/// target database is created from scratch, then the script runs
	/// batch by batch over a connection to it.
	async fn load_schema_artifact(&self, master: &mut Client<Ready>) -> Result<()> {
		let artifact = self.schema_artifact_name()?.to_string();
		let path = self.schema_artifact_path()?;
		let script = tokio::fs::read_to_string(&path).await
			.map_err(|e| Error::deployment(&artifact, e))?;

		let database = &self.config.database_name;
		info!("deploying schema artifact {} into {}", artifact, database);

		if self.catalog_database_exists(master, database).await? {
			master.simple_query(
				&format!("ALTER DATABASE [{database}] SET SINGLE_USER WITH ROLLBACK IMMEDIATE"),
			).await.map_err(|e| Error::deployment(&artifact, e))?;
			master.simple_query(&format!("DROP DATABASE [{database}]")).await
				.map_err(|e| Error::deployment(&artifact, e))?;
		}
		master.simple_query(&format!("CREATE DATABASE [{database}]")).await
			.map_err(|e| Error::deployment(&artifact, e))?;

		let mut target = self.connect_to(database).await?;
		for batch in split_batches(&script) {
			target.simple_query(&batch).await
				.map_err(|e| Error::deployment(&artifact, e))?;
		}
		target.close().await.map_err(|e| Error::deployment(&artifact, e))?;

		Ok(())
	}

	/// Captures the snapshot next to the database's primary data file.
	/// Created once after the first deploy and reused for every later
	/// reset; it is never recreated per run.
	async fn create_snapshot(&self, master: &mut Client<Ready>) -> Result<()> {
		let database = &self.config.database_name;
		let snapshot = self.config.snapshot_name();

		let rows = master.query(&primary_file_path_query(database), &[]).await
			.map_err(|e| Error::snapshot(&snapshot, e))?
			.collect_all().await
			.map_err(|e| Error::snapshot(&snapshot, e))?;
		let file_path = rows.first()
			.and_then(|row| row.get_string(0))
			.ok_or_else(|| Error::snapshot(&snapshot, "could not locate the primary data file"))?;

		info!("creating snapshot {} of {}", snapshot, database);
		master.simple_query(&create_snapshot_statement(database, &snapshot, &file_path)).await
			.map_err(|e| Error::snapshot(&snapshot, e))?;

		Ok(())
	}

	/// Rolls the database back to its snapshot. Single-user mode kicks
	/// out in-flight connections that would otherwise block the restore.
	async fn restore_from_snapshot(&self, master: &mut Client<Ready>) -> Result<()> {
		let database = &self.config.database_name;
		let snapshot = self.config.snapshot_name();
		info!("restoring {} from snapshot {}", database, snapshot);

		for statement in restore_statements(database, &snapshot) {
			master.simple_query(&statement).await
				.map_err(|e| Error::snapshot(&snapshot, e))?;
		}

		Ok(())
	}

	async fn drop_snapshot(&self, master: &mut Client<Ready>) -> Result<()> {
		let snapshot = self.config.snapshot_name();
		info!("dropping stale snapshot {}", snapshot);

		master.simple_query(&format!(
			"EXEC msdb.dbo.sp_delete_database_backuphistory @database_name = N'{snapshot}'",
		)).await.map_err(|e| Error::snapshot(&snapshot, e))?;
		master.simple_query(&format!("DROP DATABASE [{snapshot}]")).await
			.map_err(|e| Error::snapshot(&snapshot, e))?;

		Ok(())
	}
}

impl TestHarness for SqlServerHarness {
	type Connection = Client<Ready>;

	fn config(&self) -> &HarnessConfig {
		&self.config
	}

	async fn open_connection(&self) -> Result<Client<Ready>> {
		self.connect_to(&self.config.database_name).await
	}

	async fn prepare_database(&self) -> Result<()> {
		let mut master = self.master_client().await?;

		let database_exists =
			self.catalog_database_exists(&mut master, &self.config.database_name).await?;
		let snapshot_exists =
			self.catalog_database_exists(&mut master, &self.config.snapshot_name()).await?;

		match PreparePlan::determine(no_snapshots(), database_exists, snapshot_exists) {
			PreparePlan::Rebuild { drop_stale_snapshot } => {
				info!("not using snapshots for analytics middle tier integration testing");
				if drop_stale_snapshot {
					// best-effort: a leftover snapshot must not block the rebuild
					if let Err(e) = self.drop_snapshot(&mut master).await {
						warn!("failed to drop stale snapshot {}: {}", self.config.snapshot_name(), e);
					}
				}
				self.load_schema_artifact(&mut master).await?;
			},
			PreparePlan::RestoreSnapshot => {
				self.restore_from_snapshot(&mut master).await?;
			},
			PreparePlan::RebuildAndSnapshot => {
				self.load_schema_artifact(&mut master).await?;
				self.create_snapshot(&mut master).await?;
			},
		}

		master.close().await.map_err(Error::query)?;
		Ok(())
	}
}
