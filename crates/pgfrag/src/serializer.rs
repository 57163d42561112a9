//! The serialization engine.
//!
//! [`Serializer`] turns a [`Value`] into SQL text. Resolution order, first
//! match wins:
//!
//! 1. the custom hook, when installed and it returns `Some`
//! 2. [`Value::Raw`]: the fragment text, verbatim
//! 3. [`Value::List`]: `(a,b,...)`, each element serialized recursively
//! 4. [`escape::literal`] for everything else
//!
//! A serializer is a plain value that can be passed around. The free helper
//! functions (`list`, `insert`, `sql!`, ...) use the process-wide instance
//! returned by [`Serializer::global`], which has no hook until
//! [`Serializer::install_global`] is called.
//!
//! # Example
//!
//! ```ignore
//! use pgfrag::{Serializer, Value};
//!
//! Serializer::install_global(Serializer::new().with_hook(|v: &Value| {
//!     v.downcast_custom::<Point>().map(|p| format!("point({},{})", p.x, p.y))
//! }));
//! ```

use crate::escape;
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Custom serialization hook: `Some(text)` is used verbatim, `None` defers to
/// the default rules.
pub type SerializeHook = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

static GLOBAL_HOOK: RwLock<Option<SerializeHook>> = RwLock::new(None);

/// Serialization configuration.
#[derive(Clone, Default)]
pub struct Serializer {
    hook: Option<SerializeHook>,
}

impl Serializer {
    /// A serializer without a hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a custom hook. The hook's output is trusted to be safe SQL.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// The process-wide serializer.
    pub fn global() -> Self {
        let hook = GLOBAL_HOOK
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Self { hook }
    }

    /// Replace the process-wide serializer.
    ///
    /// Meant to be called once during startup, before fragments are built
    /// concurrently.
    pub fn install_global(serializer: Serializer) {
        let mut slot = GLOBAL_HOOK
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = serializer.hook;
    }

    /// Serialize a value into SQL text.
    pub fn serialize(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write(&mut out, value);
        out
    }

    pub(crate) fn write(&self, out: &mut String, value: &Value) {
        if let Some(hook) = &self.hook {
            if let Some(text) = hook(value) {
                out.push_str(&text);
                return;
            }
        }

        match value {
            Value::Raw(sql) => out.push_str(sql.as_str()),
            Value::List(items) => {
                out.push('(');
                self.write_separated(out, items, ",");
                out.push(')');
            }
            other => out.push_str(&escape::literal(other)),
        }
    }

    pub(crate) fn write_separated<'v>(
        &self,
        out: &mut String,
        values: impl IntoIterator<Item = &'v Value>,
        sep: &str,
    ) {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write(out, value);
        }
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("hook", &self.hook.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Serialize with the process-wide serializer.
pub fn serialize(value: impl Into<Value>) -> String {
    Serializer::global().serialize(&value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::raw;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl fmt::Display for Point {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{},{}", self.x, self.y)
        }
    }

    fn point_hook(v: &Value) -> Option<String> {
        v.downcast_custom::<Point>()
            .map(|p| format!("point({},{})", p.x, p.y))
    }

    #[test]
    fn quote_cannot_break_out() {
        let s = Serializer::new();
        let text = s.serialize(&"x' OR '1'='1".into());
        assert_eq!(text, "'x'' OR ''1''=''1'");
        // Every quote inside the literal is doubled: stripping the outer
        // quotes leaves only pairs.
        let inner = &text[1..text.len() - 1];
        assert!(inner.replace("''", "").find('\'').is_none());
    }

    #[test]
    fn list_is_parenthesized_and_recursive() {
        let s = Serializer::new();
        let a = Value::from(1);
        let b = Value::from("b");
        let c = Value::from(raw("now()"));
        let expected = format!(
            "({},{},{})",
            s.serialize(&a),
            s.serialize(&b),
            s.serialize(&c)
        );
        assert_eq!(s.serialize(&Value::List(vec![a, b, c])), expected);
        assert_eq!(expected, "(1,'b',now())");
        assert_eq!(s.serialize(&Value::List(vec![])), "()");
    }

    #[test]
    fn raw_round_trips() {
        let s = Serializer::new();
        for text in ["", "SELECT 1", "a = 'b''c'", "E'\\\\'"] {
            assert_eq!(s.serialize(&raw(text).into()), text);
        }
    }

    #[test]
    fn hook_output_is_used_verbatim() {
        let s = Serializer::new().with_hook(point_hook);
        assert_eq!(
            s.serialize(&Value::custom(Point { x: 1, y: 2 })),
            "point(1,2)"
        );
        // No opinion: default rules apply.
        assert_eq!(s.serialize(&Value::from("a")), "'a'");
    }

    #[test]
    fn hook_short_circuits_default_rules() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let s = Serializer::new().with_hook(move |v| {
            seen.fetch_add(1, Ordering::SeqCst);
            match v {
                Value::Text(t) if t == "secret" => Some("'***'".to_string()),
                Value::Raw(_) => Some("hooked".to_string()),
                _ => None,
            }
        });

        assert_eq!(s.serialize(&"secret".into()), "'***'");
        // The hook wins even over raw fragments.
        assert_eq!(s.serialize(&raw("x").into()), "hooked");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn hook_sees_list_elements() {
        let s = Serializer::new().with_hook(point_hook);
        let v = Value::List(vec![
            Value::custom(Point { x: 1, y: 1 }),
            Value::from(3),
        ]);
        assert_eq!(s.serialize(&v), "(point(1,1),3)");
    }

    #[test]
    fn custom_without_hook_is_a_literal() {
        let s = Serializer::new();
        assert_eq!(s.serialize(&Value::custom(Point { x: 1, y: 2 })), "'1,2'");
    }

    #[derive(Debug)]
    struct GlobalOnly;

    impl fmt::Display for GlobalOnly {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("global-only")
        }
    }

    #[test]
    fn global_serializer_can_be_installed() {
        // Only claims `GlobalOnly`, so other tests using the global instance are unaffected.
        Serializer::install_global(Serializer::new().with_hook(|v: &Value| {
            v.downcast_custom::<GlobalOnly>()
                .map(|_| "'from-global'".to_string())
        }));

        assert!(Serializer::global().has_hook());
        assert_eq!(serialize(Value::custom(GlobalOnly)), "'from-global'");
        assert_eq!(serialize(5), "5");
    }
}
