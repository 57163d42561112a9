//! Raw SQL fragments.
//!
//! [`Sql`] is a piece of SQL text that is already safe to concatenate: it is
//! produced by the template composer, by every structural helper, or by
//! [`raw`] when the caller vouches for the text. Fragment text is never
//! escaped again.
//!
//! [`Packed`] pairs a fragment with a row transform that the façade applies to
//! each returned row.
//!
//! # Example
//!
//! ```ignore
//! use pgfrag::{raw, sql};
//!
//! let active = raw("status = 'active'");
//! let q = sql!("SELECT id, name FROM users WHERE ", active, " AND id > ", 10, "")
//!     .pack(|row: tokio_postgres::Row| Ok((row.try_get::<_, i64>(0)?, row.try_get::<_, String>(1)?)));
//! ```

use crate::error::SqlResult;
use crate::row::FromRow;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::Row;

/// Already-safe SQL text.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Sql {
    text: String,
}

/// Wrap `text` as a fragment without escaping it.
///
/// This is the escape hatch: anything passed here ends up in the statement
/// verbatim.
pub fn raw(text: impl Into<String>) -> Sql {
    Sql::raw(text)
}

impl Sql {
    /// Wrap `text` as a fragment without escaping it.
    pub fn raw(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The fragment text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Attach a row transform, producing a [`Packed`] fragment.
    ///
    /// `R` is the driver row type the transform consumes
    /// (`tokio_postgres::Row` for the real clients).
    pub fn pack<T, R, F>(self, pack: F) -> Packed<T, R>
    where
        F: Fn(R) -> SqlResult<T> + Send + Sync + 'static,
    {
        Packed {
            sql: self,
            pack: Arc::new(pack),
        }
    }

    /// Map every returned row through [`FromRow`].
    pub fn typed<T: FromRow>(self) -> Packed<T, Row> {
        self.pack(|row: Row| T::from_row(&row))
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sql").field(&self.text).finish()
    }
}

impl AsRef<str> for Sql {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<Sql> for String {
    fn from(sql: Sql) -> Self {
        sql.text
    }
}

impl From<&Sql> for Sql {
    fn from(sql: &Sql) -> Self {
        sql.clone()
    }
}

type PackFn<T, R> = Arc<dyn Fn(R) -> SqlResult<T> + Send + Sync>;

/// A fragment carrying a row transform.
pub struct Packed<T, R = Row> {
    sql: Sql,
    pack: PackFn<T, R>,
}

impl<T, R> Packed<T, R> {
    /// The fragment this transform is attached to.
    pub fn sql(&self) -> &Sql {
        &self.sql
    }

    pub fn into_sql(self) -> Sql {
        self.sql
    }

    /// Replace the row transform. The previous one is discarded.
    pub fn pack<U, F>(self, pack: F) -> Packed<U, R>
    where
        F: Fn(R) -> SqlResult<U> + Send + Sync + 'static,
    {
        self.sql.pack(pack)
    }

    /// Run the transform on one row.
    pub fn unpack(&self, row: R) -> SqlResult<T> {
        (self.pack)(row)
    }
}

impl<T, R> Clone for Packed<T, R> {
    fn clone(&self) -> Self {
        Self {
            sql: self.sql.clone(),
            pack: Arc::clone(&self.pack),
        }
    }
}

impl<T, R> fmt::Debug for Packed<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packed")
            .field("sql", &self.sql.text)
            .finish_non_exhaustive()
    }
}

impl<T, R> From<Packed<T, R>> for Sql {
    fn from(packed: Packed<T, R>) -> Self {
        packed.sql
    }
}

/// Something the façade can run: SQL text plus a way to turn each driver row
/// into the caller's result type.
pub trait Query<R>: Send + Sync {
    type Output: Send;

    fn sql(&self) -> &str;

    fn unpack(&self, row: R) -> SqlResult<Self::Output>;
}

impl<R: Send> Query<R> for Sql {
    type Output = R;

    fn sql(&self) -> &str {
        &self.text
    }

    fn unpack(&self, row: R) -> SqlResult<R> {
        Ok(row)
    }
}

impl<T: Send, R> Query<R> for Packed<T, R> {
    type Output = T;

    fn sql(&self) -> &str {
        &self.sql.text
    }

    fn unpack(&self, row: R) -> SqlResult<T> {
        (self.pack)(row)
    }
}
