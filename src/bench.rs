//! Trial runner and orchestration
//!
//! A strategy is timed over `trial_count` trials, each against a freshly
//! drawn workload, and the mean is compared with the first strategy timed in
//! the run (the baseline).

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::error::{BenchError, Result};
use crate::session::Session;
use crate::strategy::{Catalogue, Strategy};
use crate::workload::{RowId, WorkloadGenerator};

/// Mean timing of one strategy at one batch size.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub description: String,
    pub mean: Duration,
    /// `baseline / mean`: above 1.0 means faster than the baseline
    pub ratio: f64,
    pub trials: usize,
}

impl BenchmarkReport {
    pub fn mean_millis(&self) -> f64 {
        self.mean.as_secs_f64() * 1000.0
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:6.1} ms  x{:<6.2}  {}",
            self.mean_millis(),
            self.ratio,
            self.description
        )
    }
}

/// `baseline / mean`, guarded against zero durations.
pub fn speed_ratio(baseline: Duration, mean: Duration) -> f64 {
    match (baseline.is_zero(), mean.is_zero()) {
        (true, true) => 1.0,
        (_, true) => f64::INFINITY,
        _ => baseline.as_secs_f64() / mean.as_secs_f64(),
    }
}

/// Everything one benchmark run shares: the connection, the random sequence
/// and the baseline.
pub struct BenchContext {
    session: Session,
    workload: WorkloadGenerator,
    trial_count: u32,
    baseline: Option<Duration>,
}

impl BenchContext {
    pub fn new(session: Session, workload: WorkloadGenerator, trial_count: usize) -> Result<Self> {
        let trial_count = u32::try_from(trial_count)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                BenchError::Config(format!("trial count must be in 1..=u32::MAX, got {trial_count}"))
            })?;
        Ok(BenchContext {
            session,
            workload,
            trial_count,
            baseline: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mean of the first strategy benchmarked, once there is one.
    pub fn baseline(&self) -> Option<Duration> {
        self.baseline
    }

    pub fn trial_count(&self) -> usize {
        self.trial_count as usize
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Time `strategy` over every trial and report its mean.
    pub fn bench(&mut self, strategy: &dyn Strategy, portion: usize) -> Result<BenchmarkReport> {
        let mut rids: Vec<RowId> = Vec::with_capacity(self.workload.update_count());
        let mut description = String::new();
        let mut total = Duration::ZERO;

        for trial in 0..self.trial_count {
            // New ids every time, otherwise the store serves cached pages
            self.workload.fill(&mut rids);

            let start = Instant::now();
            description = strategy.run(&self.session, &rids, portion)?;
            let elapsed = start.elapsed();

            debug!("{} trial {}: {:?}", description, trial, elapsed);
            total += elapsed;
        }

        let mean = total / self.trial_count;
        let baseline = *self.baseline.get_or_insert_with(|| {
            info!("baseline set by `{}`: {:?}", description, mean);
            mean
        });

        Ok(BenchmarkReport {
            description,
            mean,
            ratio: speed_ratio(baseline, mean),
            trials: self.trial_count as usize,
        })
    }
}

/// Runs every catalogue entry in order, one after another.
pub struct Orchestrator {
    catalogue: Catalogue,
}

impl Orchestrator {
    pub fn new(catalogue: Catalogue) -> Self {
        Orchestrator { catalogue }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Benchmark each entry, handing every report to `on_report` as soon as
    /// it is ready. Stops at the first error.
    pub fn run<F>(&self, ctx: &mut BenchContext, mut on_report: F) -> Result<Vec<BenchmarkReport>>
    where
        F: FnMut(&BenchmarkReport),
    {
        let mut reports = Vec::with_capacity(self.catalogue.len());
        for entry in self.catalogue.entries() {
            let report = ctx.bench(entry.strategy.as_ref(), entry.portion)?;
            on_report(&report);
            reports.push(report);
        }
        Ok(reports)
    }
}
