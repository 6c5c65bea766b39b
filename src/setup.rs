//! Benchmark table creation and seed data

use std::time::{Duration, Instant};

use duckdb::types::Value;
use log::info;
use rand::Rng;

use crate::error::{BenchError, Result};
use crate::session::Session;
use crate::workload::RowId;

/// Table every strategy updates.
pub const TABLE: &str = "bench_rows";

const CODE_MIN: i32 = 100;
const CODE_SPAN: i32 = 900;
const NAME_MIN_LEN: usize = 15;
const NAME_EXTRA_LEN: usize = 15;

/// Create the table and seed it. Returns how long the seed load took.
pub fn prepare_table<R: Rng>(session: &Session, total_rows: RowId, rng: &mut R) -> Result<Duration> {
    create_schema(session)?;
    populate(session, total_rows, rng)
}

pub fn create_schema(session: &Session) -> Result<()> {
    session
        .connection()
        .execute_batch(&format!(
            "
            DROP TABLE IF EXISTS {TABLE};
            CREATE TABLE {TABLE} (
                rid INTEGER NOT NULL PRIMARY KEY,
                code INTEGER NOT NULL,
                name TEXT NOT NULL,
                mark INTEGER NOT NULL
            );
            "
        ))
        .map_err(setup_err("create table"))?;

    // rid is already indexed by the primary key
    session
        .connection()
        .execute_batch(&format!(
            "
            CREATE INDEX IF NOT EXISTS idx_code ON {TABLE} (code);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_code_name ON {TABLE} (code, name);
            "
        ))
        .map_err(setup_err("create indexes"))?;

    info!("created table {}", TABLE);
    Ok(())
}

/// Append `total_rows` rows with `mark = 0` inside one transaction.
pub fn populate<R: Rng>(session: &Session, total_rows: RowId, rng: &mut R) -> Result<Duration> {
    let start = Instant::now();
    let tx = session.begin()?;
    {
        let seed_err = setup_err("seed rows");
        let mut appender = session.connection().appender(TABLE).map_err(&seed_err)?;
        for rid in 0..total_rows {
            let code = CODE_MIN + rng.gen_range(0..CODE_SPAN);
            appender
                .append_row([
                    Value::Int(rid),
                    Value::Int(code),
                    Value::Text(random_name(rng)),
                    Value::Int(0),
                ])
                .map_err(&seed_err)?;
        }
        appender.flush().map_err(&seed_err)?;
    }
    tx.commit()?;

    let elapsed = start.elapsed();
    info!("seeded {} rows in {:?}", total_rows, elapsed);
    Ok(elapsed)
}

fn setup_err(step: &'static str) -> impl Fn(duckdb::Error) -> BenchError {
    move |source| BenchError::Setup { step, source }
}

/// Lowercase ASCII name, 15 to 29 letters long.
pub fn random_name<R: Rng>(rng: &mut R) -> String {
    let len = NAME_MIN_LEN + rng.gen_range(0..NAME_EXTRA_LEN);
    (0..len).map(|_| char::from(b'a' + rng.gen_range(0..26u8))).collect()
}

/// Engine version string, e.g. `v1.4.3`.
pub fn engine_version(session: &Session) -> Result<String> {
    session
        .connection()
        .query_row("SELECT version()", [], |row| row.get(0))
        .map_err(setup_err("read engine version"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn names_are_lowercase_and_bounded() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let name = random_name(&mut rng);
            assert!((15..30).contains(&name.len()));
            assert!(name.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn prepared_table_has_every_row_unmarked() {
        let session = Session::open_in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        prepare_table(&session, 500, &mut rng).unwrap();

        let (rows, min_rid, max_rid, marks): (i64, i32, i32, i64) = session
            .connection()
            .query_row(
                &format!("SELECT COUNT(*), MIN(rid), MAX(rid), SUM(mark)::BIGINT FROM {TABLE}"),
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(rows, 500);
        assert_eq!((min_rid, max_rid), (0, 499));
        assert_eq!(marks, 0);

        let (lo, hi): (i32, i32) = session
            .connection()
            .query_row(&format!("SELECT MIN(code), MAX(code) FROM {TABLE}"), [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert!(lo >= 100 && hi < 1000);
    }

    #[test]
    fn preparing_twice_starts_over() {
        let session = Session::open_in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        prepare_table(&session, 100, &mut rng).unwrap();
        session
            .connection()
            .execute_batch(&format!("UPDATE {TABLE} SET mark = 5"))
            .unwrap();
        prepare_table(&session, 50, &mut rng).unwrap();

        let (rows, marks): (i64, i64) = session
            .connection()
            .query_row(&format!("SELECT COUNT(*), SUM(mark)::BIGINT FROM {TABLE}"), [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!((rows, marks), (50, 0));
    }

    #[test]
    fn version_is_reported() {
        let session = Session::open_in_memory().unwrap();
        assert!(engine_version(&session).unwrap().starts_with('v'));
    }
}
