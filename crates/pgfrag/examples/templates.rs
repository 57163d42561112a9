//! Fragment composition without a database.
//!
//! Run with: cargo run --example templates -p pgfrag

use pgfrag::{
    Columns, Serializer, SqlResult, Template, Value, and_else, array, concat, ident, insert, join,
    list, or, qualified, raw, set, sql, values,
};
use std::fmt;

/// An application type rendered through the serializer hook.
#[derive(Debug)]
struct Point {
    x: f64,
    y: f64,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(serde::Serialize)]
struct NewUser<'a> {
    name: &'a str,
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<&'a str>,
}

fn main() -> SqlResult<()> {
    Serializer::install_global(Serializer::new().with_hook(|v: &Value| {
        v.downcast_custom::<Point>()
            .map(|p| format!("point({},{})", p.x, p.y))
    }));

    // Values are escaped, static text is not.
    let name = "O'Brien; DROP TABLE users; --";
    println!("{}", sql!("SELECT * FROM users WHERE name = ", name, ""));

    // Optional filters.
    let min_age: Option<i32> = Some(21);
    let country: Option<&str> = None;
    let filter = and_else(
        [
            min_age.map(|a| sql!("age >= ", a, "")),
            country.map(|c| sql!("country = ", c, "")),
        ],
        raw("TRUE"),
    );
    let roles = or([sql!("role = ", "admin", ""), sql!("role = ", "owner", "")])?;
    println!(
        "{}",
        sql!("SELECT ", join([ident("id"), ident("name")]), " FROM ", qualified("public.users")?,
             " WHERE ", filter, " AND (", roles, ") AND id IN ", list([1, 2, 3]), "")
    );

    // INSERT from a serde struct; skipped fields are omitted, None is NULL.
    let user = Columns::from_serialize(&NewUser {
        name: "ann",
        email: None,
        nickname: None,
    })?;
    println!("{}", sql!("INSERT INTO users ", insert(&user)?, " RETURNING id"));

    // UPDATE with a custom type and a raw expression.
    let changes = Columns::new()
        .set("location", Value::custom(Point { x: 1.5, y: -2.0 }))
        .set("tags", array(["a", "b"]))
        .set("updated_at", raw("now()"));
    println!("{}", sql!("UPDATE places SET ", set(&changes)?, " WHERE id = ", 7, ""));

    // Builder form and inline VALUES tables.
    let q = Template::new()
        .text("SELECT * FROM ")
        .value(values(vec![vec![Value::from(1), "x".into()], vec![2.into(), "y".into()]]))
        .text(" AS t(id, label)")
        .build();
    println!("{}", concat([q, raw("LIMIT 1")]));

    Ok(())
}
