//! SQL logging.
//!
//! With the `tracing` feature (on by default), [`SqlTracer`] emits every
//! statement the façade runs, including `BEGIN`/`COMMIT`/`ROLLBACK`, on the
//! `pgfrag.sql` target:
//!
//! ```ignore
//! use pgfrag::{Db, SqlTracer};
//!
//! let db = Db::pool(pool).with_tracer(SqlTracer::new().max_sql_length(500));
//! ```
//!
//! Rollback failures and discarded connections are always logged at `WARN`
//! when the feature is enabled, tracer or not.

use crate::error::SqlError;
use std::time::Duration;
#[cfg(feature = "tracing")]
use tracing::Level;

/// The kind of round-trip being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stmt {
    Query,
    Execute,
    Begin,
    Commit,
    Rollback,
}

impl Stmt {
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Stmt::Query => "query",
            Stmt::Execute => "execute",
            Stmt::Begin => "begin",
            Stmt::Commit => "commit",
            Stmt::Rollback => "rollback",
        }
    }
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// A `tracing`-based logger for the SQL the façade executes.
///
/// Enable via the crate feature: `pgfrag = { features = ["tracing"] }`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct SqlTracer {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

#[cfg(feature = "tracing")]
impl Default for SqlTracer {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

#[cfg(feature = "tracing")]
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

#[cfg(feature = "tracing")]
impl SqlTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn statement(&self, kind: Stmt, sql: &str) {
        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "pgfrag.sql",
            kind = kind.as_str(),
            sql = %sql,
        );
    }

    fn finished(&self, kind: Stmt, rows: usize, elapsed: Duration) {
        emit_at_level!(
            self.level,
            target: "pgfrag.sql",
            kind = kind.as_str(),
            rows,
            elapsed_us = elapsed.as_micros() as u64,
            "completed"
        );
    }
}

/// The façade's logging handle: a no-op unless a tracer is installed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tracing {
    #[cfg(feature = "tracing")]
    tracer: Option<SqlTracer>,
}

impl Tracing {
    #[cfg(feature = "tracing")]
    pub(crate) fn new(tracer: SqlTracer) -> Self {
        Self {
            tracer: Some(tracer),
        }
    }

    pub(crate) fn statement(&self, kind: Stmt, sql: &str) {
        #[cfg(feature = "tracing")]
        if let Some(tracer) = &self.tracer {
            tracer.statement(kind, sql);
        }
        #[cfg(not(feature = "tracing"))]
        let _ = (kind, sql);
    }

    pub(crate) fn finished(&self, kind: Stmt, rows: usize, elapsed: Duration) {
        #[cfg(feature = "tracing")]
        if let Some(tracer) = &self.tracer {
            tracer.finished(kind, rows, elapsed);
        }
        #[cfg(not(feature = "tracing"))]
        let _ = (kind, rows, elapsed);
    }

    pub(crate) fn rollback_failed(&self, original: &SqlError, rollback: &SqlError) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "pgfrag.sql",
            error = %original,
            rollback_error = %rollback,
            "ROLLBACK failed; discarding connection"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (original, rollback);
    }

    pub(crate) fn discarded(&self) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "pgfrag.sql",
            "connection dropped inside a transaction; discarding it"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_sql() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // 'é' is two bytes; cutting at 2 would split it.
        assert_eq!(truncate_sql_bytes("aé", 2), "a");
        assert_eq!(truncate_sql_bytes("aé", 3), "aé");
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracer_truncates_with_ellipsis() {
        let tracer = SqlTracer::new().max_sql_length(6);
        assert_eq!(tracer.truncate_sql("SELECT 1"), "SELECT...");
        assert_eq!(tracer.no_truncate().truncate_sql("SELECT 1"), "SELECT 1");
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracer_defaults() {
        let tracer = SqlTracer::default();
        assert_eq!(tracer.level, Level::DEBUG);
        assert_eq!(tracer.max_sql_length, Some(200));
    }
}
