//! Query and transaction façade.
//!
//! [`Db`] binds a [`ConnectionSource`] (a pool or one shared connection) and
//! runs finished fragments on it. Each call acquires a connection, runs the
//! fragment's text, maps every row through the fragment's transform and
//! releases the connection.
//!
//! [`Db::transaction`] pins one connection for the lifetime of a handler:
//!
//! ```ignore
//! use pgfrag::{sql, Db, SqlResult};
//!
//! async fn transfer(db: &Db<deadpool_postgres::Pool>, from: i64, to: i64, amount: i64) -> SqlResult<()> {
//!     db.transaction(move |tx| Box::pin(async move {
//!         tx.execute(&sql!("UPDATE accounts SET balance = balance - ", amount, " WHERE id = ", from, "")).await?;
//!         tx.execute(&sql!("UPDATE accounts SET balance = balance + ", amount, " WHERE id = ", to, "")).await?;
//!         Ok(())
//!     }))
//!     .await
//! }
//! ```
//!
//! The handler's `Ok` commits, its `Err` rolls back and is returned as-is.
//! If `ROLLBACK` itself fails the connection is discarded and
//! [`SqlError::RollbackFailed`] carries both errors. The connection goes back
//! to its source exactly once on every path, including a panicking handler
//! or a dropped future. Such a connection is discarded; a shared [`Single`]
//! connection is rolled back before its next use instead.

use crate::client::Executor;
use crate::error::{SqlError, SqlResult};
use crate::sql::{Query, Sql};
use crate::trace::{Stmt, Tracing};
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::trace::SqlTracer;

/// Where the façade gets connections from.
pub trait ConnectionSource: Send + Sync {
    type Conn: Executor;

    /// Check out a connection.
    fn acquire(&self) -> impl Future<Output = SqlResult<Self::Conn>> + Send;

    /// Return a healthy connection.
    fn release(&self, conn: Self::Conn);

    /// Give up a connection whose transaction state is unknown.
    ///
    /// Defaults to [`ConnectionSource::release`]; sources that can detach a
    /// connection (the pool) close it instead, so the server aborts whatever
    /// transaction was left open.
    fn discard(&self, conn: Self::Conn) {
        self.release(conn);
    }
}

/// Row type produced by a source's connections.
pub type RowOf<S> = <<S as ConnectionSource>::Conn as Executor>::Row;

/// One shared connection used for every call.
///
/// Transactions on a single connection are not isolated from concurrent
/// calls on the same `Db`; use a pool when transactions may overlap.
///
/// A discarded connection cannot be closed while other handles share it.
/// Instead it is marked, and the next [`acquire`](ConnectionSource::acquire)
/// sends `ROLLBACK` before handing it out, so a cancelled transaction never
/// leaks into later calls.
pub struct Single<E> {
    conn: Arc<E>,
    needs_rollback: Arc<AtomicBool>,
}

impl<E> Single<E> {
    pub fn new(conn: E) -> Self {
        Self::from_arc(Arc::new(conn))
    }

    pub fn from_arc(conn: Arc<E>) -> Self {
        Self {
            conn,
            needs_rollback: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<E> Clone for Single<E> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            needs_rollback: Arc::clone(&self.needs_rollback),
        }
    }
}

impl<E: Executor> ConnectionSource for Single<E> {
    type Conn = Arc<E>;

    async fn acquire(&self) -> SqlResult<Arc<E>> {
        if self.needs_rollback.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.conn.batch_execute("ROLLBACK").await {
                self.needs_rollback.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(Arc::clone(&self.conn))
    }

    fn release(&self, conn: Arc<E>) {
        drop(conn);
    }

    fn discard(&self, conn: Arc<E>) {
        self.needs_rollback.store(true, Ordering::SeqCst);
        drop(conn);
    }
}

/// Query façade over a connection source.
pub struct Db<S> {
    source: S,
    tracing: Tracing,
}

impl<S> fmt::Debug for Db<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("tracing", &self.tracing)
            .finish_non_exhaustive()
    }
}

impl<E: Executor> Db<Single<E>> {
    /// Run everything on one connection.
    pub fn single(conn: E) -> Self {
        Self::new(Single::new(conn))
    }
}

#[cfg(feature = "pool")]
impl Db<deadpool_postgres::Pool> {
    /// Run every call on a pooled connection.
    pub fn pool(pool: deadpool_postgres::Pool) -> Self {
        Self::new(pool)
    }
}

impl<S: ConnectionSource> Db<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tracing: Tracing::default(),
        }
    }

    /// Log statements through `tracing`.
    #[cfg(feature = "tracing")]
    pub fn with_tracer(mut self, tracer: SqlTracer) -> Self {
        self.tracing = Tracing::new(tracer);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run `q` and map every row through its transform.
    pub async fn query<Q>(&self, q: &Q) -> SqlResult<Vec<Q::Output>>
    where
        Q: Query<RowOf<S>>,
    {
        let lease = self.lease().await?;
        fetch_all(lease.conn()?, &self.tracing, q).await
    }

    /// Run `q` and return its first row.
    ///
    /// Fails with [`SqlError::NotFound`] when no row comes back; extra rows
    /// are ignored.
    pub async fn query_one<Q>(&self, q: &Q) -> SqlResult<Q::Output>
    where
        Q: Query<RowOf<S>>,
    {
        let lease = self.lease().await?;
        fetch_first(lease.conn()?, &self.tracing, q)
            .await?
            .ok_or_else(no_rows)
    }

    /// Run `q` and return its first row, if any.
    pub async fn query_opt<Q>(&self, q: &Q) -> SqlResult<Option<Q::Output>>
    where
        Q: Query<RowOf<S>>,
    {
        let lease = self.lease().await?;
        fetch_first(lease.conn()?, &self.tracing, q).await
    }

    /// Run statements that return no rows.
    pub async fn execute(&self, sql: &Sql) -> SqlResult<()> {
        let lease = self.lease().await?;
        run(lease.conn()?, &self.tracing, Stmt::Execute, sql.as_str()).await
    }

    /// Run `handler` inside `BEGIN` / `COMMIT`.
    ///
    /// The handler gets a [`Transaction`] bound to a dedicated connection and
    /// returns a boxed future (`Box::pin(async move { ... })`).
    ///
    /// - `Ok(v)`: `COMMIT`, then `v` (or the `COMMIT` error)
    /// - `Err(e)`: `ROLLBACK`, then `e` unchanged
    /// - `Err(e)` and `ROLLBACK` fails: the connection is discarded and
    ///   [`SqlError::RollbackFailed`] is returned
    ///
    /// Application errors can be raised with [`SqlError::handler`].
    pub async fn transaction<T, F>(&self, handler: F) -> SqlResult<T>
    where
        F: for<'t> FnOnce(Transaction<'t, S::Conn>) -> BoxFuture<'t, SqlResult<T>>,
    {
        let mut lease = self.lease().await?;

        run(lease.conn()?, &self.tracing, Stmt::Begin, "BEGIN").await?;
        lease.state = LeaseState::InTransaction;

        let outcome = handler(Transaction {
            conn: lease.conn()?,
            tracing: &self.tracing,
        })
        .await;

        match outcome {
            Ok(value) => {
                let committed = run(lease.conn()?, &self.tracing, Stmt::Commit, "COMMIT").await;
                lease.state = LeaseState::Idle;
                committed.map(|()| value)
            }
            Err(original) => {
                match run(lease.conn()?, &self.tracing, Stmt::Rollback, "ROLLBACK").await {
                    Ok(()) => {
                        lease.state = LeaseState::Idle;
                        Err(original)
                    }
                    Err(rollback) => {
                        self.tracing.rollback_failed(&original, &rollback);
                        lease.state = LeaseState::Broken;
                        Err(SqlError::RollbackFailed {
                            original: Box::new(original),
                            rollback: Box::new(rollback),
                        })
                    }
                }
            }
        }
    }

    async fn lease(&self) -> SqlResult<Lease<'_, S>> {
        let conn = self.source.acquire().await?;
        Ok(Lease {
            source: &self.source,
            tracing: &self.tracing,
            conn: Some(conn),
            state: LeaseState::Idle,
        })
    }
}

/// Query operations bound to the connection of a running transaction.
pub struct Transaction<'t, C> {
    conn: &'t C,
    tracing: &'t Tracing,
}

impl<C> Clone for Transaction<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Transaction<'_, C> {}

impl<C> fmt::Debug for Transaction<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction").finish_non_exhaustive()
    }
}

impl<'t, C: Executor> Transaction<'t, C> {
    /// Run `q` and map every row through its transform.
    pub async fn query<Q>(&self, q: &Q) -> SqlResult<Vec<Q::Output>>
    where
        Q: Query<C::Row>,
    {
        fetch_all(self.conn, self.tracing, q).await
    }

    /// Run `q` and return its first row; [`SqlError::NotFound`] when empty.
    pub async fn query_one<Q>(&self, q: &Q) -> SqlResult<Q::Output>
    where
        Q: Query<C::Row>,
    {
        fetch_first(self.conn, self.tracing, q)
            .await?
            .ok_or_else(no_rows)
    }

    pub async fn query_opt<Q>(&self, q: &Q) -> SqlResult<Option<Q::Output>>
    where
        Q: Query<C::Row>,
    {
        fetch_first(self.conn, self.tracing, q).await
    }

    pub async fn execute(&self, sql: &Sql) -> SqlResult<()> {
        run(self.conn, self.tracing, Stmt::Execute, sql.as_str()).await
    }

    /// The underlying connection, for driver calls the façade does not cover.
    pub fn connection(&self) -> &'t C {
        self.conn
    }
}

// ==================== Connection lease ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeaseState {
    Idle,
    InTransaction,
    Broken,
}

/// A checked-out connection that goes back to its source exactly once, on drop.
struct Lease<'s, S: ConnectionSource> {
    source: &'s S,
    tracing: &'s Tracing,
    conn: Option<S::Conn>,
    state: LeaseState,
}

impl<S: ConnectionSource> Lease<'_, S> {
    fn conn(&self) -> SqlResult<&S::Conn> {
        self.conn
            .as_ref()
            .ok_or_else(|| SqlError::Connection("connection already released".to_string()))
    }
}

impl<S: ConnectionSource> Drop for Lease<'_, S> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match self.state {
            LeaseState::Idle => self.source.release(conn),
            LeaseState::InTransaction => {
                self.tracing.discarded();
                self.source.discard(conn);
            }
            LeaseState::Broken => self.source.discard(conn),
        }
    }
}

// ==================== Shared execution ====================

fn no_rows() -> SqlError {
    SqlError::not_found("query returned no rows")
}

async fn run<E: Executor>(conn: &E, tracing: &Tracing, kind: Stmt, sql: &str) -> SqlResult<()> {
    tracing.statement(kind, sql);
    let start = Instant::now();
    conn.batch_execute(sql).await?;
    tracing.finished(kind, 0, start.elapsed());
    Ok(())
}

async fn fetch_rows<E: Executor>(conn: &E, tracing: &Tracing, sql: &str) -> SqlResult<Vec<E::Row>> {
    tracing.statement(Stmt::Query, sql);
    let start = Instant::now();
    let rows = conn.query(sql).await?;
    tracing.finished(Stmt::Query, rows.len(), start.elapsed());
    Ok(rows)
}

async fn fetch_all<E, Q>(conn: &E, tracing: &Tracing, q: &Q) -> SqlResult<Vec<Q::Output>>
where
    E: Executor,
    Q: Query<E::Row>,
{
    fetch_rows(conn, tracing, q.sql())
        .await?
        .into_iter()
        .map(|row| q.unpack(row))
        .collect()
}

async fn fetch_first<E, Q>(conn: &E, tracing: &Tracing, q: &Q) -> SqlResult<Option<Q::Output>>
where
    E: Executor,
    Q: Query<E::Row>,
{
    fetch_rows(conn, tracing, q.sql())
        .await?
        .into_iter()
        .next()
        .map(|row| q.unpack(row))
        .transpose()
}
