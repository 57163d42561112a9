//! Schema-qualified identifiers.
//!
//! [`Ident`] parses a dotted path such as `public.users` or
//! `public."UserTable".id` and renders every part quoted, so the result is
//! safe to splice into a statement regardless of case or reserved words.
//!
//! Bare parts must match `[A-Za-z_][A-Za-z0-9_$]*`. A part wrapped in `"`
//! may hold anything but NUL, with `""` standing for one `"`.
//!
//! # Example
//! ```ignore
//! use pgfrag::qualified;
//!
//! assert_eq!(qualified("public.users")?.as_str(), r#""public"."users""#);
//! # Ok::<(), pgfrag::SqlError>(())
//! ```

use crate::error::{SqlError, SqlResult};
use crate::escape::write_ident;
use crate::sql::Sql;

/// A SQL identifier path (schema, table, column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// A single identifier taken as-is (no dot splitting).
    pub fn quoted(name: &str) -> SqlResult<Self> {
        if name.is_empty() {
            return Err(SqlError::validation("Empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(SqlError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self {
            parts: vec![name.to_string()],
        })
    }

    /// Split a dotted path into parts; `"..."` parts may contain dots.
    pub fn parse(path: &str) -> SqlResult<Self> {
        if path.is_empty() {
            return Err(SqlError::validation("Identifier cannot be empty"));
        }
        if path.contains('\0') {
            return Err(SqlError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut rest = path;
        loop {
            let (part, tail) = next_part(rest)?;
            parts.push(part);
            rest = match tail.strip_prefix('.') {
                Some("") => return Err(SqlError::validation("Trailing '.' in identifier")),
                Some(tail) => tail,
                None if tail.is_empty() => return Ok(Self { parts }),
                None => {
                    return Err(SqlError::validation(format!(
                        "Expected '.' after identifier part, found {tail:?}"
                    )));
                }
            };
        }
    }

    /// The unquoted parts, in order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Render as SQL with every part quoted.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            write_ident(&mut out, part);
        }
        out
    }
}

impl From<Ident> for Sql {
    fn from(ident: Ident) -> Self {
        Sql::raw(ident.to_sql())
    }
}

/// Read one part off the front of `input`, returning its text and what follows.
fn next_part(input: &str) -> SqlResult<(String, &str)> {
    if let Some(body) = input.strip_prefix('"') {
        let mut name = String::new();
        let mut rest = body;
        loop {
            let Some(end) = rest.find('"') else {
                return Err(SqlError::validation("Unclosed quoted identifier"));
            };
            name.push_str(&rest[..end]);
            rest = &rest[end + 1..];
            match rest.strip_prefix('"') {
                Some(after) => {
                    name.push('"');
                    rest = after;
                }
                None => break,
            }
        }
        if name.is_empty() {
            return Err(SqlError::validation("Empty quoted identifier"));
        }
        return Ok((name, rest));
    }

    let end = input.find('.').unwrap_or(input.len());
    let (name, rest) = input.split_at(end);
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(SqlError::validation("Empty identifier segment")),
        Some(c) if c != '_' && !c.is_ascii_alphabetic() => {
            return Err(SqlError::validation(format!(
                "Identifier part {name:?} must start with a letter or '_'"
            )));
        }
        Some(_) => {}
    }
    if let Some(c) = chars.find(|&c| c != '_' && c != '$' && !c.is_ascii_alphanumeric()) {
        return Err(SqlError::validation(format!(
            "Invalid character {c:?} in identifier part {name:?}"
        )));
    }
    Ok((name.to_string(), rest))
}

/// Parse a dotted identifier path and render it with every part quoted.
pub fn qualified(path: &str) -> SqlResult<Sql> {
    Ident::parse(path).map(Sql::from)
}
