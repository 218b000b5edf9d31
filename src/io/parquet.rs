//! Parquet files for [`Table`]s, via Arrow.
//!
//! [`read_parquet_table`] prunes columns with a [`ProjectionMask`], so
//! unselected column chunks are never decoded.

use crate::error::Error;
use crate::io::arrow::{record_batch_to_table, schema_from_arrow, table_to_record_batch};
use crate::table::Table;
use anyhow::{Context, Result};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::{File, create_dir_all};
use std::path::Path;
use tracing::debug;

/// Write `table` as a single-row-group Parquet file; returns rows written.
///
/// # Errors
/// Returns an error if the file cannot be created or the writer fails.
pub fn write_parquet_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let batch = table_to_record_batch(table)?;

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).context("create ArrowWriter")?;
    writer.write(&batch).context("write batch to parquet")?;
    writer.close().context("close ArrowWriter")?;
    Ok(table.num_rows())
}

/// Read a Parquet file, optionally keeping only `col_select` (in that order).
///
/// # Errors
/// An unknown selected column fails with [`Error::UnknownColumn`] (reachable
/// through `downcast_ref`). Other failures carry file context.
pub fn read_parquet_table(path: impl AsRef<Path>, col_select: Option<&[&str]>) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("open ParquetRecordBatchReader")?;
    let file_schema = schema_from_arrow(builder.schema())
        .with_context(|| format!("schema of {}", path.display()))?;

    let mut builder = builder.with_batch_size(64 * 1024);
    let mut out_schema = file_schema.clone();
    if let Some(names) = col_select {
        let indices = names
            .iter()
            .map(|n| file_schema.index_of(n).ok_or_else(|| Error::unknown_column(*n)))
            .collect::<crate::Result<Vec<_>>>()?;
        out_schema = file_schema.project(names)?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
        builder = builder.with_projection(mask);
    }
    let reader = builder.build().context("build ParquetRecordBatchReader")?;

    let mut tables = Vec::new();
    for batch in reader {
        let batch = batch.context("read next batch")?;
        tables.push(record_batch_to_table(&batch)?);
    }
    debug!(
        target: "ironframe::io",
        path = %path.display(),
        batches = tables.len(),
        "read parquet"
    );
    let table = if tables.is_empty() {
        Table::empty(&out_schema)
    } else {
        Table::concat(&tables)?
    };
    match col_select {
        Some(names) => Ok(table.project(names)?),
        None => Ok(table),
    }
}
