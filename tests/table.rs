use ironframe::testing::{assert_tables_equal, mixed_types, sample_scores};
use ironframe::{ColumnBuffer, DataType, Error, Field, Schema, Table, TableBuilder, Value};

#[test]
fn project_keeps_requested_order() -> anyhow::Result<()> {
    let t = mixed_types();
    let p = t.project(&["flag", "id"])?;
    assert_eq!(p.column_names(), vec!["flag", "id"]);
    assert_eq!(p.num_rows(), 4);
    assert_eq!(p.row(0), vec![Value::Bool(true), Value::Int64(1)]);
    Ok(())
}

#[test]
fn project_unknown_column_fails() {
    let err = sample_scores().project(&["nope"]).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { ref name } if name == "nope"));
}

#[test]
fn concat_appends_rows_in_order() -> anyhow::Result<()> {
    let t = sample_scores();
    let both = Table::concat(&[t.clone(), t.slice(&[2])])?;
    assert_eq!(both.num_rows(), 4);
    assert_eq!(
        both.column("group").unwrap().values().collect::<Vec<_>>(),
        vec![
            Value::from("A"),
            Value::from("B"),
            Value::from("C"),
            Value::from("C")
        ]
    );
    Ok(())
}

#[test]
fn concat_rejects_different_schemas() {
    let a = sample_scores();
    let b = a.project(&["score", "group"]).unwrap();
    assert!(matches!(
        Table::concat(&[a.clone(), b]),
        Err(Error::SchemaMismatch(_))
    ));

    let renamed = Table::try_new(vec![
        ColumnBuffer::utf8("group", vec![Some("Z")]),
        ColumnBuffer::float64("score", vec![Some(1.0)]),
    ])
    .unwrap();
    assert!(matches!(
        Table::concat(&[a, renamed]),
        Err(Error::SchemaMismatch(_))
    ));
}

#[test]
fn slice_gathers_rows_and_nulls() {
    let t = mixed_types();
    let s = t.slice(&[3, 1]);
    assert_eq!(s.num_rows(), 2);
    assert_eq!(s.column("id").unwrap().value(0), Value::Null);
    assert_eq!(s.column("id").unwrap().value(1), Value::Int64(2));
    assert_eq!(s.column("flag").unwrap().null_count(), 1);
}

#[test]
fn construction_rejects_duplicates_and_ragged_columns() {
    let dup = Table::try_new(vec![
        ColumnBuffer::int64("a", vec![Some(1)]),
        ColumnBuffer::int64("a", vec![Some(2)]),
    ]);
    assert!(matches!(dup, Err(Error::InvalidTable(_))));

    let ragged = Table::try_new(vec![
        ColumnBuffer::int64("a", vec![Some(1), Some(2)]),
        ColumnBuffer::int64("b", vec![Some(1)]),
    ]);
    assert!(matches!(ragged, Err(Error::InvalidTable(_))));
}

#[test]
fn builder_checks_types_and_arity() -> anyhow::Result<()> {
    let schema = Schema::try_new(vec![
        Field::new("name", DataType::Utf8),
        Field::new("n", DataType::Int64),
    ])?;
    let mut b = TableBuilder::new(schema);
    b.push_row(vec!["x".into(), 1.into()])?;
    b.push_row(vec![Value::Null, Value::Null])?;

    let err = b.push_row(vec!["y".into(), "oops".into()]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { ref column, expected: DataType::Int64, .. } if column == "n"));
    assert!(matches!(b.push_row(vec!["y".into()]), Err(Error::InvalidTable(_))));

    let t = b.finish()?;
    assert_eq!(t.num_rows(), 2);
    assert_eq!(t.column("n").unwrap().null_count(), 1);
    Ok(())
}

#[test]
fn nulls_compare_equal_regardless_of_stored_value() -> anyhow::Result<()> {
    let explicit = ColumnBuffer::int64("n", vec![Some(1), None]);
    let from_values = ColumnBuffer::from_values("n", DataType::Int64, &[1.into(), Value::Null])?;
    assert_eq!(explicit, from_values);
    Ok(())
}

#[test]
fn constant_column_repeats_value() -> anyhow::Result<()> {
    let c = ColumnBuffer::constant("Month", DataType::Int64, &Value::Int64(5), 3)?;
    assert_eq!(c.values().collect::<Vec<_>>(), vec![Value::Int64(5); 3]);

    let nulls = ColumnBuffer::constant("Month", DataType::Int64, &Value::Null, 2)?;
    assert_eq!(nulls.null_count(), 2);

    assert!(matches!(
        ColumnBuffer::constant("Month", DataType::Int64, &Value::from("5"), 1),
        Err(Error::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn sort_by_all_columns_is_order_insensitive() {
    let t = sample_scores();
    let shuffled = t.slice(&[2, 0, 1]);
    assert_tables_equal(&shuffled.sort_by_all_columns(), &t.sort_by_all_columns());
}

#[test]
fn display_shows_shape_and_nulls() {
    let text = mixed_types().to_string();
    assert!(text.contains("4 x 4"), "{text}");
    assert!(text.contains("NA"), "{text}");
}
