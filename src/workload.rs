//! Workload generation
//!
//! A workload is the sorted list of row ids one trial updates. A fresh one is
//! drawn before every trial: repeating the same ids would let the store's
//! buffer cache absorb the cost and skew the comparison.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{BenchError, Result};

/// Primary key of a row in the benchmark table.
pub type RowId = i32;

/// Draws workloads from one random sequence that is seeded once per run.
pub struct WorkloadGenerator {
    rng: StdRng,
    total_rows: RowId,
    update_count: usize,
}

impl WorkloadGenerator {
    pub fn new(seed: u64, total_rows: RowId, update_count: usize) -> Result<Self> {
        if update_count > 0 && total_rows <= 0 {
            return Err(BenchError::Config(format!(
                "cannot draw {update_count} row ids from an empty table"
            )));
        }
        Ok(WorkloadGenerator {
            rng: StdRng::seed_from_u64(seed),
            total_rows,
            update_count,
        })
    }

    pub fn total_rows(&self) -> RowId {
        self.total_rows
    }

    pub fn update_count(&self) -> usize {
        self.update_count
    }

    /// The shared random sequence. Seed-data loading draws from it too, so
    /// the whole run is reproducible from a single seed.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Refill `rids` with `update_count` ids in `[0, total_rows)`, sorted.
    /// Duplicates are allowed and simply hit the same row again.
    pub fn fill(&mut self, rids: &mut Vec<RowId>) {
        rids.clear();
        let total = self.total_rows;
        rids.extend((0..self.update_count).map(|_| self.rng.gen_range(0..total)));
        rids.sort_unstable();
    }

    pub fn next_workload(&mut self) -> Vec<RowId> {
        let mut rids = Vec::with_capacity(self.update_count);
        self.fill(&mut rids);
        rids
    }
}
