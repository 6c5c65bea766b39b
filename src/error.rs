//! Error types for the benchmark harness
//!
//! Every failure in a run is fatal. The variants only exist so the caller
//! can tell which operation broke before it gives up.

use thiserror::Error;

/// Longest SQL text kept in an error message.
const SQL_PREVIEW: usize = 120;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("failed to open database `{target}`: {source}")]
    Open {
        target: String,
        source: duckdb::Error,
    },

    #[error("statement failed `{sql}`: {source}")]
    Statement { sql: String, source: duckdb::Error },

    #[error("prepare failed `{sql}`: {source}")]
    Prepare { sql: String, source: duckdb::Error },

    #[error("{action} failed: {source}")]
    Transaction {
        action: &'static str,
        source: duckdb::Error,
    },

    #[error("setup step `{step}` failed: {source}")]
    Setup {
        step: &'static str,
        source: duckdb::Error,
    },

    #[error("failed to close connection: {0}")]
    Close(#[source] duckdb::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BenchError {
    pub(crate) fn statement(sql: &str, source: duckdb::Error) -> Self {
        BenchError::Statement {
            sql: abbreviate(sql),
            source,
        }
    }

    pub(crate) fn prepare(sql: &str, source: duckdb::Error) -> Self {
        BenchError::Prepare {
            sql: abbreviate(sql),
            source,
        }
    }
}

/// Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

fn abbreviate(sql: &str) -> String {
    match sql.char_indices().nth(SQL_PREVIEW) {
        Some((cut, _)) => format!("{}...", &sql[..cut]),
        None => sql.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sql_is_kept_whole() {
        assert_eq!(abbreviate("UPDATE t SET x = 1"), "UPDATE t SET x = 1");
    }

    #[test]
    fn long_sql_is_cut() {
        let sql = format!("UPDATE t SET x = 1 WHERE id IN ({})", "7,".repeat(200));
        let short = abbreviate(&sql);
        assert_eq!(short.len(), SQL_PREVIEW + 3);
        assert!(short.ends_with("..."));
        assert!(short.starts_with("UPDATE t SET x = 1 WHERE id IN (7,7,"));
    }
}
