use std::future::Future;

use crate::config::HarnessConfig;
use crate::error::Result;

/// The contract every engine-specific harness fulfills.
///
/// `prepare_database` is idempotent: after it returns, the target
/// database exists, contains no residual data from a prior run's writes
/// and holds all deployed schema objects the tests need. Connections are
/// opened fresh per call and closed by the caller; nothing is pooled.
pub trait TestHarness {
	/// The engine-specific connection handle.
	type Connection;

	fn config(&self) -> &HarnessConfig;

	/// Opens a live connection to the configured database.
	fn open_connection(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

	/// Brings the target database to a clean, ready-to-test state.
	fn prepare_database(&self) -> impl Future<Output = Result<()>> + Send;

	/// Removes prior analytics-layer objects before a rebuild.
	fn uninstall(&self) -> impl Future<Output = Result<()>> + Send {
		async { Ok(()) }
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::config::DataStandard;

	struct Noop(HarnessConfig);

	impl TestHarness for Noop {
		type Connection = ();

		fn config(&self) -> &HarnessConfig {
			&self.0
		}

		async fn open_connection(&self) -> Result<()> {
			Ok(())
		}

		async fn prepare_database(&self) -> Result<()> {
			self.uninstall().await
		}
	}

	#[tokio::test]
	async fn uninstall_defaults_to_a_noop() {
		let harness = Noop(HarnessConfig::postgres(DataStandard::Ds32));
		harness.uninstall().await.expect("default uninstall succeeds");
		harness.prepare_database().await.expect("prepare runs the default uninstall");
	}
}
