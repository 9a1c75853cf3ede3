//! Test-database provisioning for the analytics middle tier.
//!
//! The analytics middle tier is a layer of SQL views and procedures built
//! on top of the operational schema. Its integration tests need a database
//! that is in a known, clean state before every run.
//!
//! This crate provides one harness per engine:
//!
//! - [`PostgresHarness`] resets state by truncating every table the
//!   superuser role owns in the managed schemas.
//! - [`SqlServerHarness`] either restores a previously captured database
//!   snapshot or rebuilds the database from its schema artifact, whichever
//!   the environment asks for.
//!
//! Test setup constructs one harness per (engine, data standard) pair,
//! calls [`TestHarness::prepare_database`] once per run and opens fresh
//! connections for individual assertions through the same harness.

#[macro_use]
extern crate log;

pub mod config;
pub mod constants;
pub mod error;
pub mod harness;
pub mod mssql;
pub mod postgres;
pub mod util;

pub use config::{DataStandard, Engine, HarnessConfig};
pub use error::{Error, Result};
pub use harness::TestHarness;
pub use mssql::SqlServerHarness;
pub use postgres::PostgresHarness;
