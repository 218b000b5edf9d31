//! Conversion between [`Table`] and Arrow [`RecordBatch`].
//!
//! Int64, Float64, Utf8 and Boolean arrays map one-to-one. Narrower or
//! unsigned integers, `Float16`/`Float32`, `LargeUtf8` and `Utf8View` arrays
//! are cast on the way in. A value the cast cannot represent (a `UInt64`
//! above `i64::MAX`) is an error, never a null. Anything else is rejected.

use crate::column::{ColumnBuffer, ColumnData};
use crate::schema::{Field, Schema};
use crate::table::Table;
use crate::types::DataType;
use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::{
    DataType as ArrowType, Field as ArrowField, Float64Type, Int64Type, Schema as ArrowSchema,
};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// Arrow type used to store a column type.
#[must_use]
pub fn arrow_type(data_type: DataType) -> ArrowType {
    match data_type {
        DataType::Int64 => ArrowType::Int64,
        DataType::Float64 => ArrowType::Float64,
        DataType::Utf8 => ArrowType::Utf8,
        DataType::Bool => ArrowType::Boolean,
    }
}

/// Column type an Arrow type is read back as, if supported.
#[must_use]
pub fn from_arrow_type(arrow: &ArrowType) -> Option<DataType> {
    match arrow {
        ArrowType::Int8
        | ArrowType::Int16
        | ArrowType::Int32
        | ArrowType::Int64
        | ArrowType::UInt8
        | ArrowType::UInt16
        | ArrowType::UInt32
        | ArrowType::UInt64 => Some(DataType::Int64),
        ArrowType::Float16 | ArrowType::Float32 | ArrowType::Float64 => Some(DataType::Float64),
        ArrowType::Utf8 | ArrowType::LargeUtf8 | ArrowType::Utf8View => Some(DataType::Utf8),
        ArrowType::Boolean => Some(DataType::Bool),
        _ => None,
    }
}

/// Every field nullable, so null patterns always survive.
#[must_use]
pub fn arrow_schema(schema: &Schema) -> ArrowSchema {
    ArrowSchema::new(
        schema
            .fields
            .iter()
            .map(|f| ArrowField::new(f.name.clone(), arrow_type(f.data_type), true))
            .collect::<Vec<_>>(),
    )
}

fn to_array(column: &ColumnBuffer) -> ArrayRef {
    let valid = |i: usize| !column.is_null(i);
    match column.data() {
        ColumnData::Int64(v) => Arc::new(Int64Array::from_iter(
            v.iter().enumerate().map(|(i, x)| valid(i).then_some(*x)),
        )),
        ColumnData::Float64(v) => Arc::new(Float64Array::from_iter(
            v.iter().enumerate().map(|(i, x)| valid(i).then_some(*x)),
        )),
        ColumnData::Utf8(v) => Arc::new(StringArray::from_iter(
            v.iter().enumerate().map(|(i, x)| valid(i).then_some(x.as_str())),
        )),
        ColumnData::Bool(v) => Arc::new(BooleanArray::from_iter(
            v.iter().enumerate().map(|(i, x)| valid(i).then_some(*x)),
        )),
    }
}

/// Convert a table into one record batch.
///
/// # Errors
/// Returns an error if Arrow rejects the batch.
pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch> {
    let schema = Arc::new(arrow_schema(&table.schema()));
    let arrays: Vec<ArrayRef> = table.columns().iter().map(to_array).collect();
    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
    RecordBatch::try_new_with_options(schema, arrays, &options).context("build RecordBatch")
}

fn from_array(name: &str, array: &ArrayRef) -> Result<ColumnBuffer> {
    let Some(target) = from_arrow_type(array.data_type()) else {
        bail!("column {name}: unsupported Arrow type {}", array.data_type());
    };
    let array = if *array.data_type() == arrow_type(target) {
        Arc::clone(array)
    } else {
        let options = CastOptions {
            safe: false,
            ..CastOptions::default()
        };
        cast_with_options(array, &arrow_type(target), &options)
            .with_context(|| format!("column {name}: cast {} to {target}", array.data_type()))?
    };
    Ok(match target {
        DataType::Int64 => {
            ColumnBuffer::int64(name, array.as_primitive::<Int64Type>().iter().collect())
        }
        DataType::Float64 => {
            ColumnBuffer::float64(name, array.as_primitive::<Float64Type>().iter().collect())
        }
        DataType::Utf8 => ColumnBuffer::utf8(name, array.as_string::<i32>().iter().collect()),
        DataType::Bool => ColumnBuffer::boolean(name, array.as_boolean().iter().collect()),
    })
}

/// Convert a record batch into a table.
///
/// # Errors
/// Returns an error for an unsupported column type.
pub fn record_batch_to_table(batch: &RecordBatch) -> Result<Table> {
    let schema = batch.schema();
    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| from_array(field.name(), array))
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::try_new_with_rows(columns, batch.num_rows())?)
}

/// Column types of an Arrow schema.
///
/// # Errors
/// Returns an error for an unsupported field type.
pub fn schema_from_arrow(schema: &ArrowSchema) -> Result<Schema> {
    let fields = schema
        .fields()
        .iter()
        .map(|f| {
            from_arrow_type(f.data_type())
                .map(|t| Field::new(f.name().clone(), t))
                .with_context(|| format!("column {}: unsupported Arrow type {}", f.name(), f.data_type()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::try_new(fields)?)
}
