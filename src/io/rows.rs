//! Row-oriented sources feeding [`Table`] construction.
//!
//! Text decoders (CSV, JSONL) implement [`RowSource`]; [`infer_schema`] and
//! [`collect_table`] turn any source into a typed table.

use crate::error::Error;
use crate::schema::{Field, Schema};
use crate::table::{Table, TableBuilder};
use crate::types::{DataType, Value};
use anyhow::{Context, Result, bail};

/// Lazy row iterator borrowed from its source.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Vec<Value>>> + 'a>;

/// A finite, restartable sequence of rows.
///
/// Every call to [`RowSource::rows`] starts from the first row, so a source
/// can be scanned once for inference and again for collection.
pub trait RowSource {
    /// Column names, in the order row values are yielded.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or scanned.
    fn column_names(&self) -> Result<Vec<String>>;

    /// A fresh pass over the rows.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened.
    fn rows(&self) -> Result<RowIter<'_>>;
}

/// Smallest type able to hold both inputs.
#[must_use]
pub fn unify_types(a: Option<DataType>, b: Option<DataType>) -> Option<DataType> {
    match (a, b) {
        (None, t) | (t, None) => t,
        (Some(x), Some(y)) if x == y => Some(x),
        (Some(DataType::Int64), Some(DataType::Float64))
        | (Some(DataType::Float64), Some(DataType::Int64)) => Some(DataType::Float64),
        _ => Some(DataType::Utf8),
    }
}

/// Field-wise [`unify_types`] over schemas with the same column names.
///
/// # Errors
/// Fails when the schemas name different columns.
pub fn unify_schemas(a: &Schema, b: &Schema) -> Result<Schema> {
    if a.names().ne(b.names()) {
        bail!("column names differ: {a} vs {b}");
    }
    Ok(a.fields
        .iter()
        .zip(&b.fields)
        .map(|(x, y)| {
            let t = unify_types(Some(x.data_type), Some(y.data_type)).unwrap_or(DataType::Utf8);
            Field::new(x.name.clone(), t)
        })
        .collect())
}

/// Scan every row and pick a type per column.
///
/// `Int64` mixed with `Float64` widens to `Float64`; any other conflict, and
/// a column with only nulls, becomes `Utf8`.
///
/// # Errors
/// Propagates source errors and rows of the wrong arity.
pub fn infer_schema(source: &dyn RowSource) -> Result<Schema> {
    let names = source.column_names()?;
    let mut types: Vec<Option<DataType>> = vec![None; names.len()];
    for (i, row) in source.rows()?.enumerate() {
        let row = row?;
        if row.len() != names.len() {
            bail!("row {} has {} values, expected {}", i + 1, row.len(), names.len());
        }
        for (t, v) in types.iter_mut().zip(&row) {
            *t = unify_types(*t, v.data_type());
        }
    }
    let fields = names
        .into_iter()
        .zip(types)
        .map(|(name, t)| Field::new(name, t.unwrap_or(DataType::Utf8)))
        .collect();
    Ok(Schema::try_new(fields)?)
}

/// Materialize `source` under `schema`, casting each value.
///
/// # Errors
/// A value that cannot be cast fails with [`Error::TypeMismatch`], with the
/// row number attached as context.
pub fn collect_table(source: &dyn RowSource, schema: &Schema) -> Result<Table> {
    let mut builder = TableBuilder::new(schema.clone());
    for (i, row) in source.rows()?.enumerate() {
        let row = row?;
        let cast = schema
            .fields
            .iter()
            .zip(&row)
            .map(|(field, v)| {
                v.cast(field.data_type).ok_or_else(|| Error::TypeMismatch {
                    column: field.name.clone(),
                    expected: field.data_type,
                    found: format!("{} {v}", v.type_name()),
                })
            })
            .collect::<crate::Result<Vec<_>>>()
            .with_context(|| format!("row {}", i + 1))?;
        if cast.len() != row.len() || cast.len() != schema.len() {
            bail!("row {} has {} values, expected {}", i + 1, row.len(), schema.len());
        }
        builder.push_row(cast)?;
    }
    Ok(builder.finish()?)
}

/// Rows held in memory; mostly useful in tests and small pipelines.
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    pub names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSource for VecSource {
    fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }

    fn rows(&self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}
