#![cfg(feature = "io-parquet")]

use arrow::array::{ArrayRef, Float32Array, Int32Array, LargeStringArray, UInt64Array};
use arrow::datatypes::{DataType as ArrowType, Field as ArrowField, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use ironframe::io::arrow::record_batch_to_table;
use ironframe::testing::{airquality, assert_tables_equal, mixed_types};
use ironframe::{DataType, Error, Table, Value, read_parquet_table, write_parquet_table};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::sync::Arc;

#[test]
fn parquet_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mixed.parquet");
    let t = mixed_types();
    assert_eq!(write_parquet_table(&path, &t)?, 4);
    assert_tables_equal(&read_parquet_table(&path, None)?, &t);

    let aq_path = dir.path().join("aq.parquet");
    write_parquet_table(&aq_path, &airquality())?;
    assert_tables_equal(&read_parquet_table(&aq_path, None)?, &airquality());
    Ok(())
}

#[test]
fn projection_follows_requested_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mixed.parquet");
    let t = mixed_types();
    write_parquet_table(&path, &t)?;
    let back = read_parquet_table(&path, Some(&["label", "id"]))?;
    assert_tables_equal(&back, &t.project(&["label", "id"])?);

    let err = read_parquet_table(&path, Some(&["id", "missing"])).unwrap_err();
    assert!(
        matches!(err.downcast_ref::<Error>(), Some(Error::UnknownColumn { name }) if name == "missing"),
        "{err:#}"
    );
    Ok(())
}

#[test]
fn empty_tables_keep_schema() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("empty.parquet");
    let t = Table::empty(&mixed_types().schema());
    write_parquet_table(&path, &t)?;
    let back = read_parquet_table(&path, None)?;
    assert_eq!(back.num_rows(), 0);
    assert_eq!(back.schema(), t.schema());
    Ok(())
}

#[test]
fn foreign_arrow_types_are_widened() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("foreign.parquet");
    let schema = Arc::new(ArrowSchema::new(vec![
        ArrowField::new("small", ArrowType::Int32, true),
        ArrowField::new("single", ArrowType::Float32, false),
        ArrowField::new("big_text", ArrowType::LargeUtf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(vec![Some(7), None])),
        Arc::new(Float32Array::from(vec![0.5, 2.0])),
        Arc::new(LargeStringArray::from(vec![Some("x"), None])),
    ];
    let batch = RecordBatch::try_new(Arc::clone(&schema), columns)?;
    let mut writer = ArrowWriter::try_new(File::create(&path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let t = read_parquet_table(&path, None)?;
    let types: Vec<DataType> = t.columns().iter().map(|c| c.data_type()).collect();
    assert_eq!(types, vec![DataType::Int64, DataType::Float64, DataType::Utf8]);
    assert_eq!(t.row(0), vec![Value::Int64(7), Value::Float64(0.5), Value::from("x")]);
    assert_eq!(t.row(1), vec![Value::Null, Value::Float64(2.0), Value::Null]);
    Ok(())
}

#[test]
fn unsigned_overflow_is_an_error() -> anyhow::Result<()> {
    let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
        "big",
        ArrowType::UInt64,
        true,
    )]));
    let fits = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![Arc::new(UInt64Array::from(vec![Some(7), None])) as ArrayRef],
    )?;
    let t = record_batch_to_table(&fits)?;
    assert_eq!(t.row(0), vec![Value::Int64(7)]);
    assert_eq!(t.row(1), vec![Value::Null]);

    let overflow = RecordBatch::try_new(
        schema,
        vec![Arc::new(UInt64Array::from(vec![u64::MAX, 7])) as ArrayRef],
    )?;
    let err = record_batch_to_table(&overflow).unwrap_err();
    assert!(format!("{err:#}").contains("column big"), "{err:#}");
    Ok(())
}
