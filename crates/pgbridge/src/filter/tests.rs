use super::*;
use serde_json::json;

fn compiled(filter: serde_json::Value) -> (String, Vec<Value>) {
    let sql = compile(&filter).unwrap();
    let text = sql.to_sql();
    (text, sql.into_params())
}

#[test]
fn empty_filter_compiles_to_nothing() {
    let sql = compile(&json!({})).unwrap();
    assert!(sql.is_empty());
    assert!(sql.params().is_empty());

    assert!(build_query(None).unwrap().is_empty());
    assert!(build_query(Some(&json!(null))).unwrap().is_empty());
    assert!(build_query(Some(&json!({}))).unwrap().is_empty());
}

#[test]
fn implicit_equality_is_unquoted() {
    let (sql, params) = compiled(json!({"status": "active"}));
    assert_eq!(sql, "status = $1");
    assert_eq!(params, vec![Value::Text("active".into())]);
}

#[test]
fn top_level_keys_join_with_and_in_document_order() {
    let (sql, params) = compiled(json!({"b": 2, "a": 1, "c": true}));
    assert_eq!(sql, "b = $1 AND a = $2 AND c = $3");
    assert_eq!(params, vec![Value::Int(2), Value::Int(1), Value::Bool(true)]);
}

#[test]
fn logical_and_group() {
    let (sql, params) = compiled(json!({"$and": [{"a": 1}, {"b": 2}]}));
    assert_eq!(sql, "a = $1 AND b = $2");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn logical_or_group() {
    let (sql, params) = compiled(json!({"$or": [{"a": 1}, {"b": "x"}]}));
    assert_eq!(sql, "a = $1 OR b = $2");
    assert_eq!(params, vec![Value::Int(1), Value::Text("x".into())]);
}

#[test]
fn group_accepts_object_form() {
    let (sql, params) = compiled(json!({"$or": {"a": 1, "b": 2}}));
    assert_eq!(sql, "a = $1 OR b = $2");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn comparison_operators_in_column_scope() {
    let (sql, params) = compiled(json!({"age": {"$gte": 18, "$lt": 65}}));
    assert_eq!(sql, r#""age" >= $1 AND "age" < $2"#);
    assert_eq!(params, vec![Value::Int(18), Value::Int(65)]);
}

#[test]
fn every_operator_maps_to_sql() {
    let (sql, _) = compiled(json!({
        "n": {"$gt": 1, "$gte": 2, "$lt": 3, "$lte": 4, "$eq": 5}
    }));
    assert_eq!(
        sql,
        r#""n" > $1 AND "n" >= $2 AND "n" < $3 AND "n" <= $4 AND "n" = $5"#
    );
}

#[test]
fn operator_without_column_is_rejected() {
    let err = compile(&json!({"$gt": 1})).unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(
        err.to_string(),
        "Invalid input: operator '$gt' requires an enclosing column"
    );
}

#[test]
fn nested_column_scope_is_rejected() {
    let err = compile(&json!({"a": {"b": {"c": 1}}})).unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("fields in 'a' can't be nested"));
}

#[test]
fn column_scope_is_restored_after_group() {
    let (sql, params) = compiled(json!({
        "age": {"$gt": 1},
        "name": {"$eq": "bob"}
    }));
    assert_eq!(sql, r#""age" > $1 AND "name" = $2"#);
    assert_eq!(params.len(), 2);

    // A scope closed by one entry must not leak into the next.
    let err = compile(&json!({"age": {"$gt": 1}, "$lt": 5})).unwrap_err();
    assert!(err.to_string().contains("requires an enclosing column"));
}

#[test]
fn logical_group_inside_column_scope_keeps_column() {
    let (sql, params) = compiled(json!({"age": {"$or": [{"$lt": 18}, {"$gt": 65}]}}));
    assert_eq!(sql, r#""age" < $1 OR "age" > $2"#);
    assert_eq!(params, vec![Value::Int(18), Value::Int(65)]);
}

#[test]
fn or_group_is_parenthesized_under_and() {
    let (sql, params) = compiled(json!({
        "$or": [{"a": 1}, {"b": 2}],
        "c": 3
    }));
    assert_eq!(sql, "(a = $1 OR b = $2) AND c = $3");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn scoped_or_is_parenthesized_next_to_siblings() {
    let (sql, params) = compiled(json!({
        "a": 1,
        "age": {"$or": [{"$lt": 18}, {"$gt": 65}]}
    }));
    assert_eq!(sql, r#"a = $1 AND ("age" < $2 OR "age" > $3)"#);
    assert_eq!(params, vec![Value::Int(1), Value::Int(18), Value::Int(65)]);

    let (sql, _) = compiled(json!({
        "age": {"$or": {"$lt": 18, "$gt": 65}},
        "active": true
    }));
    assert_eq!(sql, r#"("age" < $1 OR "age" > $2) AND active = $3"#);
}

#[test]
fn object_form_or_is_parenthesized_under_and() {
    let (sql, params) = compiled(json!({"$or": {"x": 1, "y": 2}, "z": 3}));
    assert_eq!(sql, "(x = $1 OR y = $2) AND z = $3");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn or_inside_and_list_element_keeps_parentheses() {
    for or_group in [json!([{"x": 1}, {"y": 2}]), json!({"x": 1, "y": 2})] {
        let (sql, _) = compiled(json!({
            "$and": [{"$or": or_group}, {"z": 3}]
        }));
        assert_eq!(sql, "(x = $1 OR y = $2) AND z = $3");
    }
}

#[test]
fn nested_groups_keep_parameter_order() {
    let (sql, params) = compiled(json!({
        "$and": [
            {"$or": [{"kind": "a"}, {"kind": "b"}]},
            {"score": {"$gte": 10}}
        ]
    }));
    assert_eq!(sql, r#"(kind = $1 OR kind = $2) AND "score" >= $3"#);
    assert_eq!(
        params,
        vec![
            Value::Text("a".into()),
            Value::Text("b".into()),
            Value::Int(10)
        ]
    );
}

#[test]
fn single_child_or_is_not_wrapped() {
    let (sql, _) = compiled(json!({"$or": [{"a": 1}], "b": 2}));
    assert_eq!(sql, "a = $1 AND b = $2");
}

#[test]
fn empty_groups_and_scopes_are_skipped() {
    let (sql, params) = compiled(json!({"$and": [], "a": {}, "$or": [{}, {"b": 1}]}));
    assert_eq!(sql, "b = $1");
    assert_eq!(params, vec![Value::Int(1)]);
}

#[test]
fn null_equality_binds_null() {
    let (sql, params) = compiled(json!({"deleted_at": null}));
    assert_eq!(sql, "deleted_at = $1");
    assert_eq!(params, vec![Value::Null]);
}

#[test]
fn unsafe_keys_are_rejected() {
    for filter in [
        json!({"a; DROP TABLE users; --": 1}),
        json!({"a b": 1}),
        json!({"$ne": 1}),
        json!({"x": {"$ne": 1}}),
        json!({"bad col": {"$gt": 1}}),
    ] {
        let err = compile(&filter).unwrap_err();
        assert!(
            matches!(err, BridgeError::InvalidIdentifier(_)),
            "expected identifier error for {filter}, got {err:?}"
        );
    }
}

#[test]
fn malformed_shapes_are_rejected() {
    assert!(compile(&json!([1, 2])).is_err());
    assert!(compile(&json!("a")).is_err());
    assert!(compile(&json!({"$and": 1})).is_err());
    assert!(compile(&json!({"$or": [1, 2]})).is_err());
    assert!(compile(&json!({"a": [1, 2]})).is_err());
    assert!(compile(&json!({"a": {"$gt": {"x": 1}}})).is_err());
}

#[test]
fn placeholder_count_matches_params() {
    let filters = [
        json!({}),
        json!({"a": 1}),
        json!({"a": {"$gt": 1, "$lt": 9}, "b": "x"}),
        json!({"$or": [{"a": 1}, {"$and": [{"b": 2}, {"c": {"$lte": 3}}]}]}),
        json!({"x": {"$or": {"$gt": 1, "$lt": -1}}, "y": null}),
    ];
    for filter in filters {
        let sql = compile(&filter).unwrap();
        let text = sql.to_sql();
        assert_eq!(sql.placeholder_count(), sql.params().len(), "{filter}");
        assert_eq!(text.matches('$').count(), sql.params().len(), "{filter}");
    }
}

#[test]
fn compiles_concurrently() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let filter = json!({"n": {"$gt": i}, "$or": [{"a": i}, {"b": i}]});
                let sql = compile(&filter).unwrap();
                assert_eq!(sql.to_sql(), r#""n" > $1 AND (a = $2 OR b = $3)"#);
                sql.into_params()
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let params = h.join().unwrap();
        assert_eq!(params, vec![Value::Int(i as i64); 3]);
    }
}

#[test]
fn operator_keys_round_trip() {
    for op in [
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::Eq,
    ] {
        assert_eq!(CompareOp::from_key(op.key()), Some(op));
    }
    assert_eq!(CompareOp::from_key("$ne"), None);
}
