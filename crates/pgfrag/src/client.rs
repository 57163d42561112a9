//! Driver contract.
//!
//! [`Executor`] is the smallest surface the façade needs from a database
//! client: run a statement and collect its rows, or run statements without
//! rows. Fragments are fully rendered SQL, so no parameters are bound.

use crate::error::{SqlError, SqlResult};
use std::future::Future;
use std::sync::Arc;
use tokio_postgres::Row;

/// A connection that can run rendered SQL text.
pub trait Executor: Send + Sync {
    /// The driver's row type.
    type Row: Send;

    /// Execute a statement and return all rows.
    fn query(&self, sql: &str) -> impl Future<Output = SqlResult<Vec<Self::Row>>> + Send;

    /// Execute one or more statements, discarding any rows.
    ///
    /// Used for `BEGIN`/`COMMIT`/`ROLLBACK` and for [`Db::execute`](crate::Db::execute).
    fn batch_execute(&self, sql: &str) -> impl Future<Output = SqlResult<()>> + Send;
}

impl Executor for tokio_postgres::Client {
    type Row = Row;

    async fn query(&self, sql: &str) -> SqlResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, &[])
            .await
            .map_err(SqlError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> SqlResult<()> {
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(SqlError::from_db_error)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::ClientWrapper {
    type Row = Row;

    async fn query(&self, sql: &str) -> SqlResult<Vec<Row>> {
        Executor::query(&**self, sql).await
    }

    async fn batch_execute(&self, sql: &str) -> SqlResult<()> {
        Executor::batch_execute(&**self, sql).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    type Row = Row;

    async fn query(&self, sql: &str) -> SqlResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        Executor::query(&**self, sql).await
    }

    async fn batch_execute(&self, sql: &str) -> SqlResult<()> {
        Executor::batch_execute(&**self, sql).await
    }
}

// ===== Shared and borrowed executors =====

impl<E: Executor> Executor for Arc<E> {
    type Row = E::Row;

    fn query(&self, sql: &str) -> impl Future<Output = SqlResult<Vec<E::Row>>> + Send {
        (**self).query(sql)
    }

    fn batch_execute(&self, sql: &str) -> impl Future<Output = SqlResult<()>> + Send {
        (**self).batch_execute(sql)
    }
}

impl<E: Executor> Executor for &E {
    type Row = E::Row;

    fn query(&self, sql: &str) -> impl Future<Output = SqlResult<Vec<E::Row>>> + Send {
        (**self).query(sql)
    }

    fn batch_execute(&self, sql: &str) -> impl Future<Output = SqlResult<()>> + Send {
        (**self).batch_execute(sql)
    }
}
