//! Literal and identifier quoting.
//!
//! These functions implement the fallback rules of the serializer: every
//! scalar [`Value`] becomes a PostgreSQL literal that cannot terminate early,
//! whatever it contains.
//!
//! - strings are wrapped in `'...'` with `'` doubled; when a backslash is
//!   present the `E'...'` form is used and backslashes are doubled too, so the
//!   result means the same thing regardless of `standard_conforming_strings`
//! - identifiers are wrapped in `"..."` with `"` doubled
//! - NUL characters are dropped (PostgreSQL text cannot store them)

use crate::value::Value;
use chrono::Datelike;
use std::fmt::Write;

/// Quote `s` as a string literal.
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    write_literal(&mut out, s);
    out
}

pub(crate) fn write_literal(out: &mut String, s: &str) {
    let has_backslash = s.contains('\\');
    if has_backslash {
        out.push('E');
    }
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\0' => {}
            c => out.push(c),
        }
    }
    out.push('\'');
}

/// Quote `name` as a single identifier.
///
/// The whole string is one identifier: `a.b` becomes `"a.b"`. Use
/// [`Ident`](crate::ident::Ident) for schema-qualified names.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_ident(&mut out, name);
    out
}

pub(crate) fn write_ident(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        match ch {
            '"' => out.push_str("\"\""),
            '\0' => {}
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Render a value with the default rules.
///
/// Lists are rendered as `(a,b,...)` with these same rules; the serializer
/// handles lists itself so its hook sees every element.
pub fn literal(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Bool(true) => out.push_str("TRUE"),
        Value::Bool(false) => out.push_str("FALSE"),
        Value::Int(i) => write_signed(out, *i < 0, i),
        Value::Float(f) => write_float(out, *f),
        #[cfg(feature = "rust_decimal")]
        Value::Decimal(d) => write_signed(out, d.is_sign_negative() && !d.is_zero(), d),
        Value::Text(s) => write_literal(out, s),
        Value::Bytes(bytes) => {
            out.push_str("E'\\\\x");
            for b in bytes {
                let _ = write!(out, "{b:02x}");
            }
            out.push_str("'::bytea");
        }
        Value::Date(d) => write_dated(out, d, ""),
        Value::Time(t) => {
            let _ = write!(out, "'{}'", t.format("%H:%M:%S%.6f"));
        }
        Value::Timestamp(ts) => write_dated(out, ts, &ts.format(" %H:%M:%S%.6f").to_string()),
        Value::TimestampTz(ts) => {
            write_dated(out, ts, &ts.format(" %H:%M:%S%.6f%:z").to_string())
        }
        Value::Uuid(u) => {
            let _ = write!(out, "'{}'", u.hyphenated());
        }
        Value::Json(json) => write_literal(out, &json.to_string()),
        Value::Raw(sql) => out.push_str(sql.as_str()),
        Value::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(')');
        }
        Value::Custom(custom) => write_literal(out, &custom.to_string()),
    }
}

// A negative number right after a `-` in the template would start a `--` comment.
fn write_signed(out: &mut String, negative: bool, n: &dyn std::fmt::Display) {
    if negative {
        let _ = write!(out, "({n})");
    } else {
        let _ = write!(out, "{n}");
    }
}

// PostgreSQL takes neither a signed nor a `+`-prefixed year: years up to 1 BC
// (chrono year 0) carry a ` BC` suffix instead, and long years are written as-is.
fn write_dated(out: &mut String, date: &impl Datelike, time: &str) {
    let year = date.year();
    let (year, era) = if year <= 0 {
        (year.unsigned_abs() + 1, " BC")
    } else {
        (year.unsigned_abs(), "")
    };
    let _ = write!(
        out,
        "'{year:04}-{:02}-{:02}{time}{era}'",
        date.month(),
        date.day()
    );
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("'NaN'");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "'Infinity'" } else { "'-Infinity'" });
    } else {
        write_signed(out, f.is_sign_negative(), &f);
    }
}
