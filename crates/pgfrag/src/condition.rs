//! Boolean combinators for WHERE clauses.
//!
//! Conditions are [`Sql`] fragments, optionally absent. Absent entries are
//! dropped before anything else happens, so a filter list can be built from
//! `Option`s without branching:
//!
//! ```ignore
//! use pgfrag::{and_else, raw, sql};
//!
//! let name: Option<&str> = Some("ann");
//! let min_age: Option<i32> = None;
//!
//! let filter = and_else(
//!     [
//!         name.map(|n| sql!("name = ", n, "")),
//!         min_age.map(|a| sql!("age >= ", a, "")),
//!     ],
//!     raw("TRUE"),
//! );
//! assert_eq!(filter.as_str(), "(name = 'ann')");
//! ```
//!
//! Each kept condition is wrapped in parentheses, so operator precedence
//! inside a condition never leaks into the combination.

use crate::error::{SqlError, SqlResult};
use crate::sql::Sql;
use std::fmt;

/// How conditions are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join the present conditions with `combinator`.
///
/// With no present conditions, `default` is returned unchanged, or
/// [`SqlError::NoConditions`] when there is none.
pub fn combine<I, C>(conditions: I, combinator: Combinator, default: Option<Sql>) -> SqlResult<Sql>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Sql>>,
{
    let sep = format!(" {combinator} ");
    let mut out = String::new();
    let mut count = 0usize;

    for condition in conditions.into_iter().filter_map(Into::into) {
        if count > 0 {
            out.push_str(&sep);
        }
        out.push('(');
        out.push_str(condition.as_str());
        out.push(')');
        count += 1;
    }

    if count > 0 {
        return Ok(Sql::raw(out));
    }
    default.ok_or(SqlError::NoConditions)
}

/// `(c1) AND (c2) ...`; fails with [`SqlError::NoConditions`] when nothing is present.
pub fn and<I, C>(conditions: I) -> SqlResult<Sql>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Sql>>,
{
    combine(conditions, Combinator::And, None)
}

/// `(c1) OR (c2) ...`; fails with [`SqlError::NoConditions`] when nothing is present.
pub fn or<I, C>(conditions: I) -> SqlResult<Sql>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Sql>>,
{
    combine(conditions, Combinator::Or, None)
}

/// Like [`and`], falling back to `default`.
pub fn and_else<I, C>(conditions: I, default: Sql) -> Sql
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Sql>>,
{
    combine_or_default(conditions, Combinator::And, default)
}

/// Like [`or`], falling back to `default`.
pub fn or_else<I, C>(conditions: I, default: Sql) -> Sql
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Sql>>,
{
    combine_or_default(conditions, Combinator::Or, default)
}

fn combine_or_default<I, C>(conditions: I, combinator: Combinator, default: Sql) -> Sql
where
    I: IntoIterator<Item = C>,
    C: Into<Option<Sql>>,
{
    match combine(conditions, combinator, None) {
        Ok(sql) => sql,
        Err(_) => default,
    }
}
