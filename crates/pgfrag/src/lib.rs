//! # pgfrag
//!
//! Escaped SQL fragments for PostgreSQL, plus a small transactional query façade.
//!
//! ## Features
//!
//! - **Fragments, not strings**: values are serialized into safe literals as
//!   fragments are built; a finished [`Sql`] is never escaped again
//! - **Composable**: fragments nest inside other fragments and helpers
//!   ([`insert`], [`set`], [`and`], [`list`], ...)
//! - **Pluggable serialization**: a [`Serializer`] hook renders application types
//! - **Row transforms**: [`Sql::pack`] / [`Sql::typed`] map result rows
//! - **Transactions**: [`Db::transaction`] commits or rolls back around a handler
//!   and always returns the connection
//!
//! ## Example
//!
//! ```ignore
//! use pgfrag::{and_else, create_pool, insert, raw, sql, Columns, Db};
//!
//! let db = Db::pool(create_pool(&std::env::var("DATABASE_URL")?)?);
//!
//! let row = Columns::new().set("name", "O'Brien").set("age", 42);
//! db.execute(&sql!("INSERT INTO users ", insert(&row)?, "")).await?;
//!
//! let min_age: Option<i32> = Some(18);
//! let filter = and_else([min_age.map(|a| sql!("age >= ", a, ""))], raw("TRUE"));
//! let names: Vec<String> = db
//!     .query(&sql!("SELECT name FROM users WHERE ", filter, "")
//!         .pack(|row: tokio_postgres::Row| Ok(row.try_get(0)?)))
//!     .await?;
//! ```

pub mod builder;
pub mod client;
pub mod condition;
pub mod db;
pub mod error;
pub mod escape;
pub mod ident;
pub mod prelude;
pub mod row;
pub mod serializer;
pub mod sql;
pub mod template;
mod trace;
pub mod value;

pub use builder::{array, concat, ident, insert, join, list, multi_insert, set, values};
pub use client::Executor;
pub use condition::{Combinator, and, and_else, combine, or, or_else};
pub use db::{ConnectionSource, Db, RowOf, Single, Transaction};
pub use error::{SqlError, SqlResult};
pub use escape::{quote_ident, quote_literal};
pub use ident::{Ident, qualified};
pub use row::{FromRow, RowExt};
pub use serializer::{SerializeHook, Serializer, serialize};
pub use sql::{Packed, Query, Sql, raw};
pub use template::{Template, compose};
pub use value::{Columns, CustomValue, Value};

#[cfg(feature = "tracing")]
pub use trace::SqlTracer;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{
    PoolConfig, create_pool, create_pool_with_config, create_pool_with_manager_config,
    create_pool_with_tls,
};

// Driver crates, re-exported so callers can match versions.
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use deadpool_postgres;
