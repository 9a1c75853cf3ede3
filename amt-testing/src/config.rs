/// The database engine a harness targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
	Postgres,
	SqlServer,
}

/// A named revision of the operational schema the analytics layer is
/// built against. It determines the target database name and, for SQL
/// Server, the schema artifact deployed to rebuild that database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStandard {
	Ds2,
	Ds31,
	Ds32,
}

impl DataStandard {
	pub fn version_tag(&self) -> &'static str {
		match self {
			DataStandard::Ds2 => "2",
			DataStandard::Ds31 => "3_1",
			DataStandard::Ds32 => "3_2",
		}
	}

	fn artifact_version(&self) -> &'static str {
		match self {
			DataStandard::Ds2 => "2.0",
			DataStandard::Ds31 => "3.1",
			DataStandard::Ds32 => "3.2",
		}
	}
}

/// Identifies exactly one target database instance and the schema
/// artifact needed to (re)build it. Plain data, immutable once built;
/// test setup constructs one per (engine, data standard) pair and passes
/// it to the matching harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
	pub engine: Engine,
	pub data_standard: DataStandard,
	pub database_name: String,
	/// SQL script deployed to rebuild the database from scratch, located
	/// next to the test binary. Only set for engines that rebuild.
	pub schema_artifact: Option<String>,
}

impl HarnessConfig {
	pub fn postgres(data_standard: DataStandard) -> HarnessConfig {
		let database_name = match data_standard {
			DataStandard::Ds2 => "edfi_ods_tests_ds2",
			DataStandard::Ds31 => "edfi_ods_tests_ds31",
			DataStandard::Ds32 => "edfi_ods_tests",
		};
		HarnessConfig {
			engine: Engine::Postgres,
			data_standard,
			database_name: database_name.to_string(),
			schema_artifact: None,
		}
	}

	pub fn sql_server(data_standard: DataStandard) -> HarnessConfig {
		let database_name = match data_standard {
			DataStandard::Ds2 => "AnalyticsMiddleTier_Testing_Ds2",
			DataStandard::Ds31 => "AnalyticsMiddleTier_Testing_Ds31",
			DataStandard::Ds32 => "AnalyticsMiddleTier_Testing_Ds32",
		};
		HarnessConfig {
			engine: Engine::SqlServer,
			data_standard,
			database_name: database_name.to_string(),
			schema_artifact: Some(format!("EdFi_Ods_{}.sql", data_standard.artifact_version())),
		}
	}

	/// At most one snapshot is tracked per database, named after it.
	pub fn snapshot_name(&self) -> String {
		format!("{}_ss", self.database_name)
	}
}
