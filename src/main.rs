//! Bulk UPDATE strategy comparison
//!
//! Seeds a table, then times every strategy in the catalogue against fresh
//! random workloads and prints each one's mean latency relative to the first.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use jemallocator::Jemalloc;
use log::info;

use bulk_update_bench::config::{DEFAULT_TOTAL_ROWS, DEFAULT_TRIAL_COUNT, DEFAULT_UPDATE_COUNT};
use bulk_update_bench::{
    setup, BenchConfig, BenchContext, Catalogue, Orchestrator, Session, WorkloadGenerator,
};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser)]
#[command(name = "update_bench")]
#[command(about = "Compare bulk UPDATE strategies on DuckDB", long_about = None)]
struct Cli {
    /// Database file (in-memory when omitted)
    database: Option<PathBuf>,

    /// Rows seeded into the table
    #[arg(long, default_value_t = DEFAULT_TOTAL_ROWS)]
    rows: usize,

    /// Rows updated per trial
    #[arg(long, default_value_t = DEFAULT_UPDATE_COUNT)]
    updates: usize,

    /// Trials averaged per strategy
    #[arg(long, default_value_t = DEFAULT_TRIAL_COUNT)]
    trials: usize,

    /// Seed for table contents and workloads
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// DuckDB worker threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Print the strategies and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        BenchConfig {
            database: self.database.clone(),
            total_rows: self.rows,
            update_count: self.updates,
            trial_count: self.trials,
            seed: self.seed,
            threads: self.threads,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let catalogue = Catalogue::standard();

    if cli.list {
        for entry in catalogue.entries() {
            println!("{}", entry.describe());
        }
        return Ok(());
    }

    let config = cli.config();
    config.validate()?;

    let session = Session::open(config.database.as_deref(), config.threads)
        .context("opening the benchmark database")?;
    let version = setup::engine_version(&session)?;
    println!("Store: DuckDB {}", version);

    let mut workload =
        WorkloadGenerator::new(config.seed, config.total_rows_id()?, config.update_count)?;
    let load_time = setup::prepare_table(&session, config.total_rows_id()?, workload.rng())
        .context("preparing the benchmark table")?;
    println!(
        "Table filled ({} rows) in {} ms",
        config.total_rows,
        load_time.as_millis()
    );

    println!(
        "Updating {} rows, averaged over {} trials",
        config.update_count, config.trial_count
    );

    let mut ctx = BenchContext::new(session, workload, config.trial_count)?;
    let orchestrator = Orchestrator::new(catalogue);
    orchestrator
        .run(&mut ctx, |report| println!("{}", report))
        .context("benchmark aborted")?;

    info!("all {} strategies measured", orchestrator.catalogue().len());
    ctx.into_session().close()?;
    println!("Measurements complete.");

    Ok(())
}
