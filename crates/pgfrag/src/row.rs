//! Row mapping traits

use crate::error::{SqlError, SqlResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust value.
///
/// Used by [`Sql::typed`](crate::Sql::typed) to build a row transform.
///
/// # Example
///
/// ```ignore
/// use pgfrag::{FromRow, RowExt, SqlResult};
/// use tokio_postgres::Row;
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> SqlResult<Self> {
///         Ok(User {
///             id: row.try_get_column("id")?,
///             name: row.try_get_column("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> SqlResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning [`SqlError::Decode`] on failure
    fn try_get_column<T>(&self, column: &str) -> SqlResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Same as [`RowExt::try_get_column`] but by position.
    fn try_get_index<T>(&self, index: usize) -> SqlResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> SqlResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| SqlError::decode(column, e.to_string()))
    }

    fn try_get_index<T>(&self, index: usize) -> SqlResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(index)
            .map_err(|e| SqlError::decode(format!("#{index}"), e.to_string()))
    }
}

macro_rules! impl_from_row_tuple {
    ($($t:ident => $i:tt),+) => {
        impl<$($t),+> FromRow for ($($t,)+)
        where
            $($t: for<'a> FromSql<'a>),+
        {
            fn from_row(row: &Row) -> SqlResult<Self> {
                Ok(($(row.try_get_index::<$t>($i)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(A => 0);
impl_from_row_tuple!(A => 0, B => 1);
impl_from_row_tuple!(A => 0, B => 1, C => 2);
impl_from_row_tuple!(A => 0, B => 1, C => 2, D => 3);
