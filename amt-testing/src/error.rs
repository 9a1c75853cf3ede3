use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors a harness can surface. None of these are caught or retried
/// inside the crate; a failed reset must fail the invoking test run.
#[derive(Debug, Error)]
pub enum Error {
	/// The server is unreachable or rejected the credentials.
	#[error("failed to open a connection to database `{database}`")]
	Connection {
		database: String,
		#[source]
		source: Source,
	},

	/// The schema artifact is missing or the server rejected the deploy.
	#[error("failed to deploy schema artifact `{artifact}`")]
	Deployment {
		artifact: String,
		#[source]
		source: Source,
	},

	/// Creating, restoring or dropping a database snapshot failed.
	#[error("snapshot operation on `{snapshot}` failed")]
	Snapshot {
		snapshot: String,
		#[source]
		source: Source,
	},

	/// A catalog or reset query failed.
	#[error("catalog or reset query failed")]
	Query {
		#[source]
		source: Source,
	},
}

impl Error {
	pub(crate) fn connection(database: impl Into<String>, source: impl Into<Source>) -> Error {
		Error::Connection { database: database.into(), source: source.into() }
	}

	pub(crate) fn deployment(artifact: impl Into<String>, source: impl Into<Source>) -> Error {
		Error::Deployment { artifact: artifact.into(), source: source.into() }
	}

	pub(crate) fn snapshot(snapshot: impl Into<String>, source: impl Into<Source>) -> Error {
		Error::Snapshot { snapshot: snapshot.into(), source: source.into() }
	}

	pub(crate) fn query(source: impl Into<Source>) -> Error {
		Error::Query { source: source.into() }
	}
}

pub type Result<T> = std::result::Result<T, Error>;
