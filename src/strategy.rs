//! Bulk UPDATE strategies
//!
//! Every strategy applies `mark = mark + 1` to the rows named by a workload.
//! They differ only in how statements are built and grouped:
//!
//! 1. One bound-parameter statement per row (with or without prepare)
//! 2. One prepared statement with a fixed-size `IN (?, ...)` list per group
//! 3. One statement per group with the ids inlined as literal text
//! 4. Ids staged in a temporary table, then one join-based UPDATE
//!
//! and in whether they run under one explicit transaction or let every
//! statement commit on its own.

use std::fmt::Write;

use duckdb::params_from_iter;

use crate::error::Result;
use crate::session::Session;
use crate::setup::TABLE;
use crate::workload::RowId;

const STAGING_TABLE: &str = "staged_rids";

/// One way of applying the bulk update.
///
/// `portion` is the batch size for grouped strategies and is ignored by the
/// others (the catalogue passes zero for them).
pub trait Strategy {
    /// Short label for reports. Unique per design point and batch size.
    fn describe(&self, portion: usize) -> String;

    fn apply(&self, session: &Session, rids: &[RowId], portion: usize) -> Result<()>;

    /// Apply the update and return the description.
    fn run(&self, session: &Session, rids: &[RowId], portion: usize) -> Result<String> {
        self.apply(session, rids, portion)?;
        Ok(self.describe(portion))
    }
}

fn update_one_sql() -> String {
    format!("UPDATE {TABLE} SET mark = mark + 1 WHERE rid = ?")
}

/// `UPDATE ... WHERE rid IN (1,2,3)` with the ids as literal text.
pub fn update_in_list_sql(group: &[RowId]) -> String {
    let mut sql = format!("UPDATE {TABLE} SET mark = mark + 1 WHERE rid IN (");
    push_joined(&mut sql, group, |sql, rid| {
        let _ = write!(sql, "{rid}");
    });
    sql.push(')');
    sql
}

/// `UPDATE ... WHERE rid IN (?, ?, ?)` with `arity` placeholders.
pub fn update_placeholders_sql(arity: usize) -> String {
    format!(
        "UPDATE {TABLE} SET mark = mark + 1 WHERE rid IN ({})",
        vec!["?"; arity].join(", ")
    )
}

/// `INSERT INTO staged_rids (rid) VALUES (1), (2), (3)`
pub fn stage_insert_sql(group: &[RowId]) -> String {
    let mut sql = format!("INSERT INTO {STAGING_TABLE} (rid) VALUES ");
    push_joined(&mut sql, group, |sql, rid| {
        let _ = write!(sql, "({rid})");
    });
    sql
}

fn push_joined(sql: &mut String, group: &[RowId], mut item: impl FnMut(&mut String, RowId)) {
    for (i, &rid) in group.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        item(sql, rid);
    }
}

/// Groups of at most `portion` ids; the last group may be shorter.
/// A zero portion is treated as one id per group.
fn groups(rids: &[RowId], portion: usize) -> std::slice::Chunks<'_, RowId> {
    rids.chunks(portion.max(1))
}

// ============================================================
// One row per statement
// ============================================================

/// Bound parameter, re-parsed for every row, implicit transactions.
pub struct PerRowUnprepared;

impl Strategy for PerRowUnprepared {
    fn describe(&self, _portion: usize) -> String {
        "one row per statement, implicit transactions, bound parameter, no prepare".to_owned()
    }

    fn apply(&self, session: &Session, rids: &[RowId], _portion: usize) -> Result<()> {
        let sql = update_one_sql();
        for &rid in rids {
            session.execute(&sql, [rid])?;
        }
        Ok(())
    }
}

/// Prepared once, executed per row, implicit transactions.
pub struct PerRowPrepared;

impl Strategy for PerRowPrepared {
    fn describe(&self, _portion: usize) -> String {
        "one row per statement, implicit transactions, prepared parameter".to_owned()
    }

    fn apply(&self, session: &Session, rids: &[RowId], _portion: usize) -> Result<()> {
        let mut stmt = session.prepare(&update_one_sql())?;
        for &rid in rids {
            stmt.execute([rid])?;
        }
        Ok(())
    }
}

/// Id interpolated into the statement text, implicit transactions.
pub struct PerRowLiteral;

impl Strategy for PerRowLiteral {
    fn describe(&self, _portion: usize) -> String {
        "one row per statement, implicit transactions, literal text".to_owned()
    }

    fn apply(&self, session: &Session, rids: &[RowId], _portion: usize) -> Result<()> {
        for &rid in rids {
            let sql = format!("UPDATE {TABLE} SET mark = mark + 1 WHERE rid = {rid}");
            session.execute(&sql, [])?;
        }
        Ok(())
    }
}

/// Prepared once, executed per row, all inside one transaction.
pub struct TransactionPerRowPrepared;

impl Strategy for TransactionPerRowPrepared {
    fn describe(&self, _portion: usize) -> String {
        "single transaction, one row per statement, prepared".to_owned()
    }

    fn apply(&self, session: &Session, rids: &[RowId], _portion: usize) -> Result<()> {
        let tx = session.begin()?;
        let mut stmt = tx.prepare(&update_one_sql())?;
        for &rid in rids {
            stmt.execute([rid])?;
        }
        drop(stmt);
        tx.commit()
    }
}

// ============================================================
// Grouped statements
// ============================================================

/// One prepared `IN` list of fixed arity, reused for every full group inside
/// one transaction.
///
/// Known edge case: a trailing remainder shorter than `arity` is dropped, so
/// up to `arity - 1` ids of a workload are never updated.
pub struct TransactionPreparedInList {
    arity: usize,
}

impl TransactionPreparedInList {
    pub fn new(arity: usize) -> Self {
        TransactionPreparedInList {
            arity: arity.max(1),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl Strategy for TransactionPreparedInList {
    fn describe(&self, _portion: usize) -> String {
        format!("single transaction, prepared IN list of {}", self.arity)
    }

    fn apply(&self, session: &Session, rids: &[RowId], _portion: usize) -> Result<()> {
        let tx = session.begin()?;
        let mut stmt = tx.prepare(&update_placeholders_sql(self.arity))?;
        for group in rids.chunks_exact(self.arity) {
            stmt.execute(params_from_iter(group.iter().copied()))?;
        }
        drop(stmt);
        tx.commit()
    }
}

/// `portion` ids per statement, inlined as text.
pub struct TextBatches {
    transaction: bool,
}

impl TextBatches {
    /// All statements inside one explicit transaction.
    pub fn in_transaction() -> Self {
        TextBatches { transaction: true }
    }

    /// Every statement commits on its own.
    pub fn autocommit() -> Self {
        TextBatches { transaction: false }
    }
}

impl Strategy for TextBatches {
    fn describe(&self, portion: usize) -> String {
        if self.transaction {
            format!("single transaction, {} rows per statement as text", portion.max(1))
        } else {
            format!("implicit transactions, {} rows per statement as text", portion.max(1))
        }
    }

    fn apply(&self, session: &Session, rids: &[RowId], portion: usize) -> Result<()> {
        if !self.transaction {
            for group in groups(rids, portion) {
                session.execute(&update_in_list_sql(group), [])?;
            }
            return Ok(());
        }

        let tx = session.begin()?;
        for group in groups(rids, portion) {
            tx.execute(&update_in_list_sql(group), [])?;
        }
        tx.commit()
    }
}

// ============================================================
// Staging table
// ============================================================

/// Stage the ids in a temporary table with grouped text inserts, then run a
/// single UPDATE joined against it.
///
/// The join counts how often each id was staged so a repeated id is applied
/// as many times as it occurs, same as the per-row strategies. The staging
/// table lives only inside the transaction: it is dropped before commit and
/// a rollback discards its creation.
pub struct StagingTable;

impl StagingTable {
    fn create_sql() -> String {
        format!("CREATE TEMP TABLE {STAGING_TABLE} (rid INTEGER)")
    }

    fn update_sql() -> String {
        format!(
            "UPDATE {TABLE} SET mark = mark + staged.hits
             FROM (SELECT rid, COUNT(*)::INTEGER AS hits FROM {STAGING_TABLE} GROUP BY rid) AS staged
             WHERE {TABLE}.rid = staged.rid"
        )
    }

    fn drop_sql() -> String {
        format!("DROP TABLE {STAGING_TABLE}")
    }
}

impl Strategy for StagingTable {
    fn describe(&self, portion: usize) -> String {
        format!("staging table, inserts of {} rows", portion.max(1))
    }

    fn apply(&self, session: &Session, rids: &[RowId], portion: usize) -> Result<()> {
        if rids.is_empty() {
            return Ok(());
        }

        let tx = session.begin()?;
        tx.execute(&StagingTable::create_sql(), [])?;
        for group in groups(rids, portion) {
            tx.execute(&stage_insert_sql(group), [])?;
        }
        tx.execute(&StagingTable::update_sql(), [])?;
        tx.execute(&StagingTable::drop_sql(), [])?;
        tx.commit()
    }
}

// ============================================================
// Catalogue
// ============================================================

/// A strategy paired with the batch size it is benchmarked at.
pub struct Entry {
    pub strategy: Box<dyn Strategy>,
    pub portion: usize,
}

impl Entry {
    pub fn describe(&self) -> String {
        self.strategy.describe(self.portion)
    }
}

/// Ordered list of strategies to benchmark. The first entry is the baseline.
#[derive(Default)]
pub struct Catalogue {
    entries: Vec<Entry>,
}

impl Catalogue {
    pub fn new() -> Self {
        Catalogue::default()
    }

    /// The full comparison, cheapest-to-write strategies first.
    pub fn standard() -> Self {
        let mut catalogue = Catalogue::new()
            .with(PerRowUnprepared, 0)
            .with(PerRowPrepared, 0)
            .with(PerRowLiteral, 0)
            .with(TransactionPerRowPrepared, 0)
            .with(TransactionPreparedInList::new(4), 0)
            .with(TransactionPreparedInList::new(8), 0);

        for portion in [4, 8, 25, 100, 250] {
            catalogue = catalogue.with(TextBatches::in_transaction(), portion);
        }
        for portion in [4, 8, 25, 100, 250] {
            catalogue = catalogue.with(TextBatches::autocommit(), portion);
        }
        for portion in [8, 25, 100] {
            catalogue = catalogue.with(StagingTable, portion);
        }
        catalogue
    }

    pub fn with<S: Strategy + 'static>(mut self, strategy: S, portion: usize) -> Self {
        self.push(strategy, portion);
        self
    }

    pub fn push<S: Strategy + 'static>(&mut self, strategy: S, portion: usize) {
        self.entries.push(Entry {
            strategy: Box::new(strategy),
            portion,
        });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn literal_in_list() {
        assert_eq!(
            update_in_list_sql(&[3, 7, 7, 12]),
            "UPDATE bench_rows SET mark = mark + 1 WHERE rid IN (3,7,7,12)"
        );
        assert_eq!(
            update_in_list_sql(&[5]),
            "UPDATE bench_rows SET mark = mark + 1 WHERE rid IN (5)"
        );
    }

    #[test]
    fn placeholder_in_list() {
        assert_eq!(
            update_placeholders_sql(4),
            "UPDATE bench_rows SET mark = mark + 1 WHERE rid IN (?, ?, ?, ?)"
        );
    }

    #[test]
    fn staging_insert() {
        assert_eq!(
            stage_insert_sql(&[1, 2, 40]),
            "INSERT INTO staged_rids (rid) VALUES (1),(2),(40)"
        );
    }

    #[test]
    fn grouping_keeps_short_tail() {
        let rids: Vec<RowId> = (0..10).collect();
        let sizes: Vec<usize> = groups(&rids, 4).map(<[RowId]>::len).collect();
        assert_eq!(sizes, [4, 4, 2]);
        assert_eq!(groups(&rids, 0).count(), 10);
        assert_eq!(groups(&rids, 250).count(), 1);
        assert_eq!(groups(&[], 8).count(), 0);
    }

    #[test]
    fn standard_descriptions_are_unique() {
        let catalogue = Catalogue::standard();
        assert_eq!(catalogue.len(), 19);

        let labels: HashSet<String> = catalogue.entries().iter().map(Entry::describe).collect();
        assert_eq!(labels.len(), catalogue.len());
    }

    #[test]
    fn baseline_is_per_row_unprepared() {
        let catalogue = Catalogue::standard();
        assert_eq!(
            catalogue.entries()[0].describe(),
            PerRowUnprepared.describe(0)
        );
    }

    #[test]
    fn arity_is_at_least_one() {
        assert_eq!(TransactionPreparedInList::new(0).arity(), 1);
        assert_eq!(TransactionPreparedInList::new(8).arity(), 8);
    }
}
