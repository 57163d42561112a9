//! Structural helpers that assemble common statement pieces.
//!
//! Every helper returns a [`Sql`] fragment ready to be interpolated into a
//! template:
//!
//! - [`list`]: `(v1,v2,...)`
//! - [`values`]: `(VALUES (..),(..))`
//! - [`insert`] / [`multi_insert`]: `("c1","c2") VALUES (..)`
//! - [`array`]: `ARRAY[v1,v2,...]`
//! - [`set`]: `"c1"=v1,"c2"=v2`
//! - [`ident`]: `"name"`
//! - [`join`] / [`concat`]: fragments glued with `, ` or a space
//!
//! Helpers that serialize values use the process-wide [`Serializer`]; the
//! same operations exist as `Serializer` methods for an explicit instance.
//!
//! ```ignore
//! use pgfrag::{insert, sql, Columns};
//!
//! let row = Columns::new().set("name", "ann").set_opt("email", None::<&str>);
//! let q = sql!("INSERT INTO users ", insert(&row)?, " RETURNING id");
//! assert_eq!(q.as_str(), r#"INSERT INTO users ("name") VALUES ('ann') RETURNING id"#);
//! ```

use crate::error::{SqlError, SqlResult};
use crate::escape::write_ident;
use crate::serializer::Serializer;
use crate::sql::Sql;
use crate::value::{Columns, Value};

// ==================== Serializer methods ====================

impl Serializer {
    /// `(v1,v2,...)`, or `()` when empty.
    pub fn list<I, V>(&self, values: I) -> Sql
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let mut out = String::from("(");
        self.write_separated(&mut out, &values, ",");
        out.push(')');
        Sql::raw(out)
    }

    /// An inline `VALUES` table: `(VALUES (r1v1,r1v2),(r2v1,r2v2))`.
    pub fn values<I, R, V>(&self, rows: I) -> Sql
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut out = String::from("(VALUES ");
        for (i, row) in rows.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let row: Vec<Value> = row.into_iter().map(Into::into).collect();
            out.push('(');
            self.write_separated(&mut out, &row, ",");
            out.push(')');
        }
        out.push(')');
        Sql::raw(out)
    }

    /// Column list and `VALUES` clause for a single row.
    ///
    /// Omitted columns are skipped; fails with [`SqlError::NoColumns`] when
    /// none remain.
    pub fn insert(&self, columns: &Columns) -> SqlResult<Sql> {
        let names = columns.defined_names();
        if names.is_empty() {
            return Err(SqlError::NoColumns);
        }

        let mut out = column_list(&names);
        out.push_str(" VALUES (");
        self.write_separated(&mut out, columns.defined().map(|(_, v)| v), ",");
        out.push(')');
        Ok(Sql::raw(out))
    }

    /// Column list and `VALUES` clause for several rows.
    ///
    /// The column order comes from the first row. Every other row must define
    /// exactly the same columns (in any order), otherwise
    /// [`SqlError::ColumnMismatch`] names the offending row.
    pub fn multi_insert(&self, rows: &[Columns]) -> SqlResult<Sql> {
        let first = rows.first().ok_or(SqlError::NoRows)?;
        let names = first.defined_names();
        if names.is_empty() {
            return Err(SqlError::NoColumns);
        }

        let mut out = column_list(&names);
        out.push_str(" VALUES ");
        for (i, row) in rows.iter().enumerate() {
            let row_names = row.defined_names();
            if row_names.len() != names.len() {
                return Err(column_mismatch(i, &names, &row_names));
            }

            if i > 0 {
                out.push(',');
            }
            out.push('(');
            for (j, name) in names.iter().enumerate() {
                let value = row
                    .get(name)
                    .ok_or_else(|| column_mismatch(i, &names, &row_names))?;
                if j > 0 {
                    out.push(',');
                }
                self.write(&mut out, value);
            }
            out.push(')');
        }
        Ok(Sql::raw(out))
    }

    /// `ARRAY[v1,v2,...]`, or `ARRAY[]` when empty.
    ///
    /// An empty array usually needs a cast in the surrounding template
    /// (`ARRAY[]::int[]`).
    pub fn array<I, V>(&self, values: I) -> Sql
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let mut out = String::from("ARRAY[");
        self.write_separated(&mut out, &values, ",");
        out.push(']');
        Sql::raw(out)
    }

    /// Assignment list for `UPDATE ... SET`.
    ///
    /// Omitted columns are skipped; fails with [`SqlError::NoColumns`] when
    /// none remain.
    pub fn set(&self, columns: &Columns) -> SqlResult<Sql> {
        let mut out = String::new();
        for (i, (name, value)) in columns.defined().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_ident(&mut out, name);
            out.push('=');
            self.write(&mut out, value);
        }
        if out.is_empty() {
            return Err(SqlError::NoColumns);
        }
        Ok(Sql::raw(out))
    }
}

fn column_list(names: &[&str]) -> String {
    let mut out = String::from("(");
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_ident(&mut out, name);
    }
    out.push(')');
    out
}

fn column_mismatch(row: usize, expected: &[&str], found: &[&str]) -> SqlError {
    SqlError::ColumnMismatch {
        row,
        expected: expected.join(", "),
        found: found.join(", "),
    }
}

// ==================== Free functions (global serializer) ====================

/// [`Serializer::list`] with the process-wide serializer.
pub fn list<I, V>(values: I) -> Sql
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Serializer::global().list(values)
}

/// [`Serializer::values`] with the process-wide serializer.
pub fn values<I, R, V>(rows: I) -> Sql
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Serializer::global().values(rows)
}

/// [`Serializer::insert`] with the process-wide serializer.
pub fn insert(columns: &Columns) -> SqlResult<Sql> {
    Serializer::global().insert(columns)
}

/// [`Serializer::multi_insert`] with the process-wide serializer.
pub fn multi_insert(rows: &[Columns]) -> SqlResult<Sql> {
    Serializer::global().multi_insert(rows)
}

/// [`Serializer::array`] with the process-wide serializer.
pub fn array<I, V>(values: I) -> Sql
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Serializer::global().array(values)
}

/// [`Serializer::set`] with the process-wide serializer.
pub fn set(columns: &Columns) -> SqlResult<Sql> {
    Serializer::global().set(columns)
}

// ==================== Fragment helpers ====================

/// A single quoted identifier. Dots are part of the name; see
/// [`qualified`](crate::ident::qualified) for schema paths.
pub fn ident(name: &str) -> Sql {
    let mut out = String::with_capacity(name.len() + 2);
    write_ident(&mut out, name);
    Sql::raw(out)
}

/// Fragments joined with `, `.
pub fn join<I, S>(fragments: I) -> Sql
where
    I: IntoIterator<Item = S>,
    S: Into<Sql>,
{
    glue(fragments, ", ")
}

/// Fragments joined with a single space.
pub fn concat<I, S>(fragments: I) -> Sql
where
    I: IntoIterator<Item = S>,
    S: Into<Sql>,
{
    glue(fragments, " ")
}

fn glue<I, S>(fragments: I, sep: &str) -> Sql
where
    I: IntoIterator<Item = S>,
    S: Into<Sql>,
{
    let mut out = String::new();
    for (i, fragment) in fragments.into_iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(fragment.into().as_str());
    }
    Sql::raw(out)
}

#[cfg(test)]
mod tests;
