use ironframe::dataset::{NULL_PARTITION, PartitionKey, encode_value, plan};
use ironframe::testing::{airquality, mixed_types};
use ironframe::{ColumnBuffer, Error, Table, Value};

fn groups_table() -> Table {
    Table::try_new(vec![
        ColumnBuffer::int64("id", vec![Some(0), Some(1), Some(2), Some(3), Some(4)]),
        ColumnBuffer::utf8("group", vec![Some("B"), Some("A"), Some("B"), None, Some("A")]),
    ])
    .unwrap()
}

#[test]
fn groups_are_ordered_and_rows_ascending() -> anyhow::Result<()> {
    let groups = plan(&groups_table(), &["group"])?;
    let summary: Vec<(Value, Vec<usize>)> = groups
        .iter()
        .map(|g| (g.key.get("group").cloned().unwrap(), g.rows.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Value::from("A"), vec![1, 4]),
            (Value::from("B"), vec![0, 2]),
            (Value::Null, vec![3]),
        ]
    );
    Ok(())
}

#[test]
fn every_row_lands_in_exactly_one_group() -> anyhow::Result<()> {
    let aq = airquality();
    let groups = plan(&aq, &["Month", "Day"])?;
    assert_eq!(groups.len(), 153);
    let mut all: Vec<usize> = groups.iter().flat_map(|g| g.rows.iter().copied()).collect();
    all.sort_unstable();
    assert_eq!(all, (0..153).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn key_order_follows_requested_columns() -> anyhow::Result<()> {
    let groups = plan(&airquality(), &["Day", "Month"])?;
    let first = &groups[0].key;
    let names: Vec<&str> = first.assignments.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Day", "Month"]);
    assert_eq!(first.relative_path(), std::path::Path::new("Day=1").join("Month=5"));
    Ok(())
}

#[test]
fn canonical_string_order_is_lexicographic() -> anyhow::Result<()> {
    let t = Table::try_new(vec![ColumnBuffer::int64("n", vec![Some(5), Some(10), Some(5)])])?;
    let groups = plan(&t, &["n"])?;
    let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
    assert_eq!(keys, vec!["n=10", "n=5"]);
    assert_eq!(groups[1].rows, vec![0, 2]);
    Ok(())
}

#[test]
fn planning_is_deterministic() -> anyhow::Result<()> {
    let t = mixed_types();
    assert_eq!(plan(&t, &["label", "flag"])?, plan(&t, &["label", "flag"])?);
    Ok(())
}

#[test]
fn unknown_and_duplicate_columns_fail() {
    let t = groups_table();
    assert!(matches!(
        plan(&t, &["nope"]),
        Err(Error::UnknownColumn { ref name }) if name == "nope"
    ));
    assert!(matches!(plan(&t, &["group", "group"]), Err(Error::InvalidTable(_))));
}

#[test]
fn empty_partition_column_names_are_rejected() -> anyhow::Result<()> {
    let t = Table::try_new(vec![ColumnBuffer::int64("", vec![Some(1), Some(2)])])?;
    assert!(matches!(plan(&t, &[""]), Err(Error::InvalidTable(_))));
    Ok(())
}

#[test]
fn groups_order_by_unescaped_text() -> anyhow::Result<()> {
    let t = Table::try_new(vec![ColumnBuffer::utf8("s", vec![Some("a/b"), Some("a.c")])])?;
    let groups = plan(&t, &["s"])?;
    let values: Vec<Value> = groups.iter().map(|g| g.key.assignments[0].1.clone()).collect();
    assert_eq!(values, vec![Value::from("a.c"), Value::from("a/b")]);
    Ok(())
}

#[test]
fn no_partition_columns_is_one_group() -> anyhow::Result<()> {
    let t = groups_table();
    let groups = plan::<&str>(&t, &[])?;
    assert_eq!(groups.len(), 1);
    assert!(groups[0].key.is_empty());
    assert_eq!(groups[0].rows, vec![0, 1, 2, 3, 4]);

    assert!(plan::<&str>(&Table::empty(&t.schema()), &[])?.is_empty());
    Ok(())
}

#[test]
fn null_and_escaped_values_encode_safely() {
    assert_eq!(encode_value(&Value::Null), NULL_PARTITION);
    assert_eq!(encode_value(&Value::from("a/b=c")), "a%2Fb%3Dc");
    assert_eq!(encode_value(&Value::Float64(5.0)), "5.0");
    assert_eq!(encode_value(&Value::Float64(-0.25)), "-0.25");
    assert_eq!(encode_value(&Value::Bool(true)), "true");

    let key = PartitionKey::new(vec![
        ("label".to_string(), Value::from("x:y")),
        ("id".to_string(), Value::Null),
    ]);
    assert_eq!(key.to_string(), format!("label=x%3Ay/id={NULL_PARTITION}"));
}
