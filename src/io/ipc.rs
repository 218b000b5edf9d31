//! Arrow IPC file format (Feather v2) for [`Table`]s.

use crate::error::Error;
use crate::io::arrow::{record_batch_to_table, schema_from_arrow, table_to_record_batch};
use crate::table::Table;
use anyhow::{Context, Result};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use std::fs::{File, create_dir_all};
use std::io::BufReader;
use std::path::Path;

/// Write `table` as an Arrow IPC file; returns rows written.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_ipc_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let batch = table_to_record_batch(table)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = FileWriter::try_new(file, &batch.schema()).context("create IPC FileWriter")?;
    writer.write(&batch).context("write IPC batch")?;
    writer.finish().context("finish IPC file")?;
    Ok(table.num_rows())
}

/// Read an Arrow IPC file, optionally keeping only `col_select` (in that order).
///
/// # Errors
/// An unknown selected column fails with [`Error::UnknownColumn`]. Other
/// failures carry file context.
pub fn read_ipc_table(path: impl AsRef<Path>, col_select: Option<&[&str]>) -> Result<Table> {
    let path = path.as_ref();
    let open = || -> Result<BufReader<File>> {
        Ok(BufReader::new(
            File::open(path).with_context(|| format!("open {}", path.display()))?,
        ))
    };
    let file_schema = {
        let reader = FileReader::try_new(open()?, None).context("open IPC FileReader")?;
        schema_from_arrow(&reader.schema()).with_context(|| format!("schema of {}", path.display()))?
    };

    let projection = col_select
        .map(|names| {
            names
                .iter()
                .map(|n| file_schema.index_of(n).ok_or_else(|| Error::unknown_column(*n)))
                .collect::<crate::Result<Vec<_>>>()
        })
        .transpose()?;
    let out_schema = match col_select {
        Some(names) => file_schema.project(names)?,
        None => file_schema,
    };

    let reader = FileReader::try_new(open()?, projection).context("open IPC FileReader")?;
    let mut tables = Vec::new();
    for batch in reader {
        let batch = batch.context("read IPC batch")?;
        tables.push(record_batch_to_table(&batch)?);
    }
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
