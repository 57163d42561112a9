//! Convenient imports for typical `pgfrag` usage.
//!
//! ```ignore
//! use pgfrag::prelude::*;
//! ```

pub use crate::{
    Columns, Db, FromRow, Query, RowExt, Serializer, Sql, SqlError, SqlResult, Template,
    Transaction, Value, and, and_else, array, concat, ident, insert, join, list, multi_insert, or,
    or_else, qualified, raw, set, sql, values,
};

#[cfg(feature = "pool")]
pub use crate::{PoolConfig, create_pool};

#[cfg(feature = "tracing")]
pub use crate::SqlTracer;
