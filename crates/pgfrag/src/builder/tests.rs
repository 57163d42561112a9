use super::*;
use crate::sql::raw;

fn plain() -> Serializer {
    Serializer::new()
}

#[test]
fn test_list() {
    let s = plain();
    assert_eq!(s.list([1, 2, 3]).as_str(), "(1,2,3)");
    assert_eq!(s.list(["a", "b'c"]).as_str(), "('a','b''c')");
    assert_eq!(s.list(Vec::<i32>::new()).as_str(), "()");
}

#[test]
fn test_list_mixed_values() {
    let s = plain();
    let q = s.list([Value::from(1), Value::Null, Value::from(raw("DEFAULT"))]);
    assert_eq!(q.as_str(), "(1,NULL,DEFAULT)");
}

#[test]
fn test_values_table() {
    let s = plain();
    let q = s.values(vec![vec![Value::from(1), "a".into()], vec![2.into(), "b".into()]]);
    assert_eq!(q.as_str(), "(VALUES (1,'a'),(2,'b'))");
}

#[test]
fn test_insert_single_row() {
    let cols = Columns::new().set("a", 1).set("b", 2);
    assert_eq!(plain().insert(&cols).unwrap().as_str(), r#"("a","b") VALUES (1,2)"#);
}

#[test]
fn test_insert_drops_omitted_keeps_null() {
    let cols = Columns::new()
        .set("name", "ann")
        .set_opt("email", None::<&str>)
        .set("bio", None::<&str>);
    assert_eq!(
        plain().insert(&cols).unwrap().as_str(),
        r#"("name","bio") VALUES ('ann',NULL)"#
    );
}

#[test]
fn test_insert_no_columns() {
    let cols = Columns::new().omit("a");
    assert!(matches!(plain().insert(&cols), Err(SqlError::NoColumns)));
    assert!(matches!(insert(&Columns::new()), Err(SqlError::NoColumns)));
}

#[test]
fn test_insert_quotes_column_names() {
    let cols = Columns::new().set("we\"ird", 1).set("Order", 2);
    assert_eq!(
        plain().insert(&cols).unwrap().as_str(),
        r#"("we""ird","Order") VALUES (1,2)"#
    );
}

#[test]
fn test_multi_insert() {
    let rows = vec![
        Columns::new().set("a", 1).set("b", "x"),
        Columns::new().set("a", 2).set("b", "y"),
    ];
    assert_eq!(
        plain().multi_insert(&rows).unwrap().as_str(),
        r#"("a","b") VALUES (1,'x'),(2,'y')"#
    );
}

#[test]
fn test_multi_insert_aligns_by_name() {
    let rows = vec![
        Columns::new().set("a", 1).set("b", 2),
        Columns::new().set("b", 20).set("a", 10),
    ];
    assert_eq!(
        plain().multi_insert(&rows).unwrap().as_str(),
        r#"("a","b") VALUES (1,2),(10,20)"#
    );
}

#[test]
fn test_multi_insert_empty() {
    assert!(matches!(plain().multi_insert(&[]), Err(SqlError::NoRows)));
    let rows = vec![Columns::new().omit("a")];
    assert!(matches!(plain().multi_insert(&rows), Err(SqlError::NoColumns)));
}

#[test]
fn test_multi_insert_rejects_mismatched_rows() {
    let missing = vec![
        Columns::new().set("a", 1).set("b", 2),
        Columns::new().set("a", 3),
    ];
    match plain().multi_insert(&missing) {
        Err(SqlError::ColumnMismatch { row, expected, found }) => {
            assert_eq!(row, 1);
            assert_eq!(expected, "a, b");
            assert_eq!(found, "a");
        }
        other => panic!("unexpected {other:?}"),
    }

    let renamed = vec![
        Columns::new().set("a", 1).set("b", 2),
        Columns::new().set("a", 3).set("c", 4),
    ];
    assert!(matches!(
        plain().multi_insert(&renamed),
        Err(SqlError::ColumnMismatch { row: 1, .. })
    ));
}

#[test]
fn test_multi_insert_omitted_counts_as_missing() {
    let rows = vec![
        Columns::new().set("a", 1).set("b", 2),
        Columns::new().set("a", 3).set_opt("b", None::<i32>),
    ];
    assert!(matches!(
        plain().multi_insert(&rows),
        Err(SqlError::ColumnMismatch { .. })
    ));
}

#[test]
fn test_array() {
    let s = plain();
    assert_eq!(s.array([1, 2]).as_str(), "ARRAY[1,2]");
    assert_eq!(s.array(Vec::<&str>::new()).as_str(), "ARRAY[]");
    // Nested sequences stay parenthesized tuples.
    assert_eq!(s.array([vec![1, 2]]).as_str(), "ARRAY[(1,2)]");
}

#[test]
fn test_set_skips_omitted() {
    let cols = Columns::new().set("a", 1).omit("b").set("c", 2);
    assert_eq!(plain().set(&cols).unwrap().as_str(), r#""a"=1,"c"=2"#);
}

#[test]
fn test_set_no_columns() {
    assert!(matches!(plain().set(&Columns::new()), Err(SqlError::NoColumns)));
    let all_omitted = Columns::new().omit("a").omit("b");
    assert!(matches!(set(&all_omitted), Err(SqlError::NoColumns)));
}

#[test]
fn test_set_with_raw_value() {
    let cols = Columns::new().set("updated_at", raw("now()")).set("n", -1);
    assert_eq!(
        plain().set(&cols).unwrap().as_str(),
        r#""updated_at"=now(),"n"=(-1)"#
    );
}

#[test]
fn test_ident() {
    assert_eq!(ident("users").as_str(), r#""users""#);
    assert_eq!(ident("a\"b").as_str(), r#""a""b""#);
    assert_eq!(ident("x\0y").as_str(), r#""xy""#);
    assert_eq!(ident("public.users").as_str(), r#""public.users""#);
}

#[test]
fn test_join_and_concat() {
    let parts = [raw("a"), raw("b"), raw("c")];
    assert_eq!(join(parts.clone()).as_str(), "a, b, c");
    assert_eq!(concat(parts).as_str(), "a b c");
    assert_eq!(join(Vec::<Sql>::new()).as_str(), "");
}

#[test]
fn test_join_accepts_packed_and_refs() {
    let packed = raw("SELECT 1").pack(|n: i32| Ok(n));
    let other = raw("SELECT 2");
    let q = concat([Sql::from(packed), Sql::from(&other)]);
    assert_eq!(q.as_str(), "SELECT 1 SELECT 2");
}

#[test]
fn test_helpers_compose_into_statement() {
    let s = plain();
    let cols = Columns::new().set("name", "ann").set("age", 30);
    let q = crate::Template::new()
        .text("INSERT INTO ")
        .value(ident("users"))
        .text(" ")
        .value(s.insert(&cols).unwrap())
        .text(" RETURNING id")
        .build_with(&s);
    assert_eq!(
        q.as_str(),
        r#"INSERT INTO "users" ("name","age") VALUES ('ann',30) RETURNING id"#
    );
}

#[test]
fn test_hook_applies_inside_helpers() {
    let s = Serializer::new().with_hook(|v| match v {
        Value::Text(t) => Some(format!("upper('{}')", t.replace('\'', "''"))),
        _ => None,
    });
    let cols = Columns::new().set("name", "ann");
    assert_eq!(s.set(&cols).unwrap().as_str(), r#""name"=upper('ann')"#);
    assert_eq!(s.list(["x"]).as_str(), "(upper('x'))");
}
