#![allow(dead_code)]

use std::collections::BTreeSet;

use bulk_update_bench::setup::{self, TABLE};
use bulk_update_bench::{RowId, Session};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Fresh in-memory database with a seeded table of `rows` rows.
pub fn seeded_session(rows: RowId) -> Session {
    let session = Session::open_in_memory().unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    setup::prepare_table(&session, rows, &mut rng).unwrap();
    session.reset_stats();
    session
}

/// `mark` of every row, indexed by rid.
pub fn marks(session: &Session) -> Vec<i32> {
    let mut stmt = session
        .connection()
        .prepare(&format!("SELECT mark FROM {TABLE} ORDER BY rid"))
        .unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    let marks = rows.map(|r| r.unwrap()).collect();
    marks
}

pub fn reset_marks(session: &Session) {
    session
        .connection()
        .execute_batch(&format!("UPDATE {TABLE} SET mark = 0"))
        .unwrap();
    session.reset_stats();
}

/// Every occurrence of an id is one increment.
pub fn per_occurrence(rows: RowId, rids: &[RowId]) -> Vec<i32> {
    let mut expected = vec![0; rows as usize];
    for &rid in rids {
        expected[rid as usize] += 1;
    }
    expected
}

/// Each statement bumps every distinct id of its group once.
pub fn per_group(rows: RowId, groups: impl Iterator<Item = Vec<RowId>>) -> Vec<i32> {
    let mut expected = vec![0; rows as usize];
    for group in groups {
        let distinct: BTreeSet<RowId> = group.into_iter().collect();
        for rid in distinct {
            expected[rid as usize] += 1;
        }
    }
    expected
}
