//! Run parameters

use std::path::PathBuf;

use crate::error::{BenchError, Result};
use crate::workload::RowId;

pub const DEFAULT_TOTAL_ROWS: usize = 100_000;
pub const DEFAULT_UPDATE_COUNT: usize = 4_000;
pub const DEFAULT_TRIAL_COUNT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Database file; `None` runs against an in-memory database
    pub database: Option<PathBuf>,
    /// Rows seeded into the table
    pub total_rows: usize,
    /// Rows updated per trial
    pub update_count: usize,
    /// Trials averaged per strategy
    pub trial_count: usize,
    pub seed: u64,
    /// DuckDB worker threads
    pub threads: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            database: None,
            total_rows: DEFAULT_TOTAL_ROWS,
            update_count: DEFAULT_UPDATE_COUNT,
            trial_count: DEFAULT_TRIAL_COUNT,
            seed: 0,
            threads: 1,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.trial_count == 0 {
            return Err(BenchError::Config("trial count must be at least 1".into()));
        }
        if u32::try_from(self.trial_count).is_err() {
            return Err(BenchError::Config(format!(
                "trial count {} is too large",
                self.trial_count
            )));
        }
        if RowId::try_from(self.total_rows).is_err() {
            return Err(BenchError::Config(format!(
                "{} rows do not fit the INTEGER row id",
                self.total_rows
            )));
        }
        if self.total_rows == 0 && self.update_count > 0 {
            return Err(BenchError::Config(
                "cannot update rows of an empty table".into(),
            ));
        }
        if self.threads == 0 {
            return Err(BenchError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Row count as a row id bound. Only meaningful after [`validate`](Self::validate).
    pub fn total_rows_id(&self) -> Result<RowId> {
        RowId::try_from(self.total_rows).map_err(|_| {
            BenchError::Config(format!("{} rows do not fit the INTEGER row id", self.total_rows))
        })
    }
}
