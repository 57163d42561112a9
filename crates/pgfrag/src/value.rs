//! Values accepted by the serializer.
//!
//! [`Value`] is the closed set of shapes that can be interpolated into a
//! fragment: scalars, raw fragments, sequences, and application-defined
//! [`CustomValue`]s. Most Rust types convert with `Into<Value>`.
//!
//! [`Columns`] is the ordered `column -> value` mapping used by `insert`,
//! `multi_insert` and `set`. A column can be present but *omitted*
//! ([`Columns::set_opt`] with `None`, or [`Columns::omit`]); omitted columns
//! are dropped by those helpers, while [`Value::Null`] is written as `NULL`.

use crate::error::{SqlError, SqlResult};
use crate::sql::{Packed, Sql};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An application type that can be interpolated.
///
/// Install a serializer hook that downcasts with [`Value::downcast_custom`] to
/// render it; without one, the `Display` output is written as a quoted literal.
pub trait CustomValue: Any + fmt::Debug + fmt::Display + Send + Sync {}

impl<T> CustomValue for T where T: Any + fmt::Debug + fmt::Display + Send + Sync {}

/// A value to be serialized into SQL text.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    #[cfg(feature = "rust_decimal")]
    Decimal(rust_decimal::Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(uuid::Uuid),
    /// Serialized as a JSON text literal.
    Json(serde_json::Value),
    /// Emitted verbatim.
    Raw(Sql),
    /// Serialized as `(a,b,...)`.
    List(Vec<Value>),
    Custom(Arc<dyn CustomValue>),
}

impl Value {
    /// Wrap an application value.
    pub fn custom<T: CustomValue>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Raw bytes, rendered as a `bytea` literal.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Serialize `value` with serde and keep it as a JSON literal.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> SqlResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the inner value of a [`Value::Custom`] as `T`.
    pub fn downcast_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(inner) => {
                let any: &dyn Any = &**inner;
                any.downcast_ref::<T>()
            }
            _ => None,
        }
    }

    /// Convert one field of a JSON object: scalars keep their SQL type,
    /// arrays and objects stay JSON.
    fn from_json_field(value: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match value {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Raw(Sql::raw(u.to_string()))
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            J::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u16, u32);

// Values past i64::MAX are still plain digits, so they go out as raw text.
macro_rules! impl_from_wide_uint {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    match i64::try_from(v) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Raw(Sql::raw(v.to_string())),
                    }
                }
            }
        )*
    };
}

impl_from_wide_uint!(u64, usize);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Text(v.to_string())
    }
}

#[cfg(feature = "rust_decimal")]
impl From<rust_decimal::Decimal> for Value {
    fn from(v: rust_decimal::Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<Tz: chrono::TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::TimestampTz(v.with_timezone(&Utc))
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Sql> for Value {
    fn from(v: Sql) -> Self {
        Value::Raw(v)
    }
}

impl From<&Sql> for Value {
    fn from(v: &Sql) -> Self {
        Value::Raw(v.clone())
    }
}

impl<T, R> From<Packed<T, R>> for Value {
    fn from(v: Packed<T, R>) -> Self {
        Value::Raw(v.into_sql())
    }
}

impl<T, R> From<&Packed<T, R>> for Value {
    fn from(v: &Packed<T, R>) -> Self {
        Value::Raw(v.sql().clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&Vec<T>> for Value {
    fn from(v: &Vec<T>) -> Self {
        Value::from(v.as_slice())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Ordered `column -> value` mapping for `insert`, `multi_insert` and `set`.
///
/// A `None` entry marks a column that is present but omitted.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    entries: Vec<(String, Option<Value>)>,
}

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`. An existing entry keeps its position.
    pub fn set(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(column.into(), Some(value.into()))
    }

    /// Set `column` when `value` is `Some`, otherwise mark it omitted.
    ///
    /// Use [`Columns::set`] with `None::<T>` to write an explicit `NULL`.
    pub fn set_opt<T: Into<Value>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        self.put(column.into(), value.map(Into::into))
    }

    /// Mark `column` omitted.
    pub fn omit(self, column: impl Into<String>) -> Self {
        self.put(column.into(), None)
    }

    fn put(mut self, column: String, value: Option<Value>) -> Self {
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// Columns that are not omitted, in insertion order.
    pub fn defined(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.as_str(), v)))
    }

    /// Names of the columns that are not omitted.
    pub fn defined_names(&self) -> Vec<&str> {
        self.defined().map(|(name, _)| name).collect()
    }

    /// The value of a column, unless it is missing or omitted.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Number of entries, omitted ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from anything serde can turn into a JSON object.
    ///
    /// Fields serde skips are simply absent; `null` becomes `NULL`; nested
    /// arrays and objects are kept as JSON literals.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> SqlResult<Self> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .fold(Self::new(), |cols, (name, field)| {
                    cols.put(name, Some(Value::from_json_field(field)))
                })),
            other => Err(SqlError::Serialization(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Columns {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |cols, (name, value)| cols.set(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point(i32, i32);

    impl fmt::Display for Point {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({},{})", self.0, self.1)
        }
    }

    #[test]
    fn option_none_is_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert!(matches!(Value::from(Some(3)), Value::Int(3)));
    }

    #[test]
    fn collections_become_lists() {
        let Value::List(items) = Value::from(vec![1, 2]) else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(Value::from([true]), Value::List(_)));
        assert!(matches!(Value::from(&["a", "b"][..]), Value::List(_)));
    }

    #[test]
    fn huge_unsigned_stays_numeric() {
        match Value::from(u64::MAX) {
            Value::Raw(sql) => assert_eq!(sql.as_str(), "18446744073709551615"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(Value::from(7_u64), Value::Int(7)));
    }

    #[test]
    fn downcast_custom_value() {
        let v = Value::custom(Point(1, 2));
        let p = v.downcast_custom::<Point>().expect("point");
        assert_eq!((p.0, p.1), (1, 2));
        assert!(v.downcast_custom::<String>().is_none());
        assert!(Value::Int(1).downcast_custom::<Point>().is_none());
    }

    #[test]
    fn columns_replace_in_place() {
        let cols = Columns::new().set("a", 1).set("b", 2).set("a", 3);
        assert_eq!(cols.defined_names(), vec!["a", "b"]);
        assert!(matches!(cols.get("a"), Some(Value::Int(3))));
    }

    #[test]
    fn columns_omitted_vs_null() {
        let cols = Columns::new()
            .set("a", 1)
            .set_opt("b", None::<i32>)
            .set("c", None::<i32>)
            .omit("d");
        assert_eq!(cols.len(), 4);
        assert_eq!(cols.defined_names(), vec!["a", "c"]);
        assert!(cols.get("b").is_none());
        assert!(matches!(cols.get("c"), Some(Value::Null)));
    }

    #[test]
    fn columns_from_serialize() {
        #[derive(serde::Serialize)]
        struct NewUser {
            name: &'static str,
            age: i32,
            email: Option<&'static str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            nickname: Option<&'static str>,
            tags: Vec<&'static str>,
        }

        let cols = Columns::from_serialize(&NewUser {
            name: "ann",
            age: 30,
            email: None,
            nickname: None,
            tags: vec!["x"],
        })
        .unwrap();

        assert!(matches!(cols.get("name"), Some(Value::Text(s)) if s == "ann"));
        assert!(matches!(cols.get("age"), Some(Value::Int(30))));
        assert!(matches!(cols.get("email"), Some(Value::Null)));
        assert!(cols.get("nickname").is_none());
        assert!(matches!(cols.get("tags"), Some(Value::Json(_))));
    }

    #[test]
    fn columns_from_serialize_rejects_non_objects() {
        assert!(matches!(
            Columns::from_serialize(&[1, 2]),
            Err(SqlError::Serialization(_))
        ));
    }

    #[test]
    fn columns_from_iterator() {
        let cols: Columns = [("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(cols.defined_names(), vec!["x", "y"]);
    }
}
