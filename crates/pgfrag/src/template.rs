//! Template composition.
//!
//! A template is an alternation of static text segments and values. Static
//! text is copied as-is; every value goes through the [`Serializer`]. The
//! result is a [`Sql`] fragment that can be nested into other templates
//! without being escaped twice.
//!
//! Three entry points build the same thing:
//!
//! ```ignore
//! use pgfrag::{compose, sql, Template};
//!
//! let a = sql!("SELECT * FROM users WHERE id = ", 1, " AND name = ", "ann", "");
//! let b = Template::new()
//!     .text("SELECT * FROM users WHERE id = ")
//!     .value(1)
//!     .text(" AND name = ")
//!     .value("ann")
//!     .build();
//! let c = compose(
//!     &["SELECT * FROM users WHERE id = ", " AND name = ", ""],
//!     vec![1.into(), "ann".into()],
//! )?;
//! assert_eq!(a, b);
//! assert_eq!(b, c);
//! ```

use crate::error::{SqlError, SqlResult};
use crate::serializer::Serializer;
use crate::sql::Sql;
use crate::value::Value;

#[derive(Debug, Clone)]
enum Token {
    Text(String),
    Value(Value),
}

/// Incremental template builder.
#[derive(Debug, Clone, Default)]
pub struct Template {
    tokens: Vec<Token>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append static text. Never escaped.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.tokens.push(Token::Text(text));
        }
        self
    }

    /// Append a value to be serialized.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.tokens.push(Token::Value(value.into()));
        self
    }

    /// Append a value only when present.
    pub fn value_opt<T: Into<Value>>(self, value: Option<T>) -> Self {
        match value {
            Some(v) => self.value(v),
            None => self,
        }
    }

    /// Number of value slots.
    pub fn value_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::Value(_)))
            .count()
    }

    /// Render with the process-wide serializer.
    pub fn build(&self) -> Sql {
        self.build_with(&Serializer::global())
    }

    /// Render with an explicit serializer.
    pub fn build_with(&self, serializer: &Serializer) -> Sql {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Value(value) => serializer.write(&mut out, value),
            }
        }
        Sql::raw(out)
    }
}

impl From<Template> for Sql {
    fn from(template: Template) -> Self {
        template.build()
    }
}

impl Serializer {
    /// Interleave `segments` and `values`: `segments[0] values[0] segments[1] ...`.
    ///
    /// There must be exactly one more segment than values.
    pub fn compose<S: AsRef<str>>(&self, segments: &[S], values: Vec<Value>) -> SqlResult<Sql> {
        if segments.len() != values.len() + 1 {
            return Err(SqlError::Template {
                segments: segments.len(),
                values: values.len(),
            });
        }

        let mut out = String::new();
        let mut values = values.into_iter();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                if let Some(value) = values.next() {
                    self.write(&mut out, &value);
                }
            }
            out.push_str(segment.as_ref());
        }
        Ok(Sql::raw(out))
    }
}

/// [`Serializer::compose`] with the process-wide serializer.
pub fn compose<S: AsRef<str>>(segments: &[S], values: Vec<Value>) -> SqlResult<Sql> {
    Serializer::global().compose(segments, values)
}

/// Build a [`Sql`] fragment from alternating string literals and values.
///
/// The argument list always starts and ends with a string literal; use `""`
/// when a template ends with a value.
///
/// ```ignore
/// let id = 7;
/// let q = pgfrag::sql!("SELECT * FROM users WHERE id = ", id, "");
/// assert_eq!(q.as_str(), "SELECT * FROM users WHERE id = 7");
/// ```
#[macro_export]
macro_rules! sql {
    ($first:literal $(, $value:expr, $seg:literal)*) => {{
        let __template = $crate::Template::new().text($first);
        $( let __template = __template.value($value).text($seg); )*
        __template.build()
    }};
}
