//! Bulk UPDATE strategy benchmarks on DuckDB
//!
//! Measures how long it takes to bump a counter column on a scattered set of
//! rows using different statement shapes: one row per statement, prepared
//! statements, `IN` lists bound or inlined as text, explicit transactions or
//! autocommit, and a staging table joined into a single UPDATE.

pub mod bench;
pub mod config;
pub mod error;
pub mod session;
pub mod setup;
pub mod strategy;
pub mod workload;

pub use bench::{BenchContext, BenchmarkReport, Orchestrator};
pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use session::{Session, SessionStats};
pub use strategy::{Catalogue, Strategy};
pub use workload::{RowId, WorkloadGenerator};
