//! Thin wrapper over a DuckDB connection
//!
//! Exposes exactly what the strategies need: execute with positional
//! parameters, prepare for reuse, and an explicit transaction scope that
//! rolls back unless it is committed. Every executed statement is counted so
//! tests can check how many statements a strategy issued.

use std::cell::Cell;
use std::path::Path;

use duckdb::{Config, Connection, Params, Statement};
use log::{debug, warn};

use crate::error::{BenchError, Result};

/// Counters for everything a session has sent to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Data and DDL statements executed (direct or through a prepared handle)
    pub statements: u64,
    pub prepares: u64,
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

pub struct Session {
    conn: Connection,
    stats: Cell<SessionStats>,
}

impl Session {
    /// Open a database file, or an in-memory database when `path` is `None`.
    pub fn open(path: Option<&Path>, threads: usize) -> Result<Self> {
        let target = path.map_or_else(|| ":memory:".to_owned(), |p| p.display().to_string());
        let open_err = |source| BenchError::Open {
            target: target.clone(),
            source,
        };

        let config = Config::default()
            .with("threads", &threads.max(1).to_string())
            .map_err(open_err)?;
        let conn = match path {
            Some(path) => Connection::open_with_flags(path, config),
            None => Connection::open_in_memory_with_flags(config),
        }
        .map_err(open_err)?;

        debug!("opened {} with {} thread(s)", target, threads.max(1));
        Ok(Session::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Session::open(None, 1)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Session {
            conn,
            stats: Cell::new(SessionStats::default()),
        }
    }

    /// Raw connection, for setup work and for reading results back.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(SessionStats::default());
    }

    /// Execute one statement under its own implicit transaction (or the
    /// currently open explicit one).
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let affected = self
            .conn
            .execute(sql, params)
            .map_err(|source| BenchError::statement(sql, source))?;
        self.bump(|s| s.statements += 1);
        Ok(affected)
    }

    pub fn prepare(&self, sql: &str) -> Result<Prepared<'_>> {
        let stmt = self
            .conn
            .prepare(sql)
            .map_err(|source| BenchError::prepare(sql, source))?;
        self.bump(|s| s.prepares += 1);
        Ok(Prepared {
            session: self,
            sql: sql.to_owned(),
            stmt,
        })
    }

    /// Start an explicit transaction. Dropping the guard without calling
    /// [`TransactionGuard::commit`] rolls it back.
    pub fn begin(&self) -> Result<TransactionGuard<'_>> {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|source| BenchError::Transaction {
                action: "begin",
                source,
            })?;
        self.bump(|s| s.begun += 1);
        Ok(TransactionGuard {
            session: self,
            finished: false,
        })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, source)| BenchError::Close(source))
    }

    fn bump(&self, f: impl FnOnce(&mut SessionStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

/// A prepared statement, released when dropped.
pub struct Prepared<'s> {
    session: &'s Session,
    sql: String,
    stmt: Statement<'s>,
}

impl Prepared<'_> {
    pub fn execute<P: Params>(&mut self, params: P) -> Result<usize> {
        let affected = self
            .stmt
            .execute(params)
            .map_err(|source| BenchError::statement(&self.sql, source))?;
        self.session.bump(|s| s.statements += 1);
        Ok(affected)
    }
}

/// Explicit transaction scope whose default outcome is rollback.
pub struct TransactionGuard<'s> {
    session: &'s Session,
    finished: bool,
}

impl<'s> TransactionGuard<'s> {
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.session.execute(sql, params)
    }

    pub fn prepare(&self, sql: &str) -> Result<Prepared<'s>> {
        self.session.prepare(sql)
    }

    pub fn commit(mut self) -> Result<()> {
        self.session
            .conn
            .execute_batch("COMMIT")
            .map_err(|source| BenchError::Transaction {
                action: "commit",
                source,
            })?;
        self.finished = true;
        self.session.bump(|s| s.committed += 1);
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.session
            .conn
            .execute_batch("ROLLBACK")
            .map_err(|source| BenchError::Transaction {
                action: "rollback",
                source,
            })?;
        self.session.bump(|s| s.rolled_back += 1);
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.session.conn.execute_batch("ROLLBACK") {
            Ok(()) => {
                debug!("transaction rolled back on drop");
                self.session.bump(|s| s.rolled_back += 1);
            }
            Err(e) => warn!("rollback after failed transaction also failed: {}", e),
        }
    }
}
