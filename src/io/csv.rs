//! CSV ingestion and export for [`Table`]s.
//!
//! Cells are typed by content: the configured null markers (empty and `NA`
//! by default) become null, then integers, floats, `true`/`false` and
//! finally strings. With a declared schema each cell is parsed directly as
//! its column's type, so text such as `007` survives in a `Utf8` column.
//!
//! Files ending in `.gz` or `.zst` are (de)compressed transparently.

use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use crate::io::glob::resolve_paths;
use crate::io::rows::{RowIter, RowSource, collect_table, infer_schema, unify_schemas};
use crate::schema::Schema;
use crate::table::Table;
use crate::types::{DataType, Value};
use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How CSV text is split and typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvReadOptions {
    pub has_headers: bool,
    pub delimiter: u8,
    /// Cells equal to any of these are null. An empty cell is also null
    /// unless its column is text.
    pub null_values: Vec<String>,
    /// Declared column types; inferred from the data when absent.
    pub schema: Option<Schema>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
            null_values: vec!["NA".to_string()],
            schema: None,
        }
    }
}

impl CsvReadOptions {
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvWriteOptions {
    pub has_headers: bool,
    pub delimiter: u8,
    /// Text written for null cells; keep it distinct from `""` so empty
    /// strings survive a re-read.
    pub null_value: String,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
            null_value: "NA".to_string(),
        }
    }
}

/// One CSV file viewed as a [`RowSource`].
#[derive(Clone, Debug)]
pub struct CsvSource {
    path: PathBuf,
    options: CsvReadOptions,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, options: CsvReadOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<csv::Reader<Box<dyn std::io::Read>>> {
        let path = &self.path;
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let rdr = auto_detect_reader(f, path)
            .with_context(|| format!("setup decompression for {}", path.display()))?;
        Ok(ReaderBuilder::new()
            .has_headers(self.options.has_headers)
            .delimiter(self.options.delimiter)
            .from_reader(rdr))
    }

    fn parse_record(&self, record: &StringRecord) -> Result<Vec<Value>> {
        let nulls = &self.options.null_values;
        match &self.options.schema {
            None => Ok(record.iter().map(|cell| infer_cell(cell, nulls)).collect()),
            Some(schema) => schema
                .fields
                .iter()
                .zip(record.iter())
                .map(|(field, cell)| {
                    if nulls.iter().any(|n| n == cell)
                        || (cell.is_empty() && field.data_type != DataType::Utf8)
                    {
                        return Ok(Value::Null);
                    }
                    Value::parse_as(cell, field.data_type).ok_or_else(|| {
                        anyhow!("column {}: {cell:?} is not a valid {}", field.name, field.data_type)
                    })
                })
                .collect(),
        }
    }
}

impl RowSource for CsvSource {
    fn column_names(&self) -> Result<Vec<String>> {
        let mut rdr = self.reader()?;
        if self.options.has_headers {
            let headers = rdr
                .headers()
                .with_context(|| format!("read CSV header of {}", self.path.display()))?;
            return Ok(headers.iter().map(str::to_string).collect());
        }
        let width = match rdr.records().next() {
            Some(rec) => rec.with_context(|| format!("read {}", self.path.display()))?.len(),
            None => self.options.schema.as_ref().map_or(0, Schema::len),
        };
        Ok((1..=width).map(|i| format!("column_{i}")).collect())
    }

    fn rows(&self) -> Result<RowIter<'_>> {
        let rdr = self.reader()?;
        Ok(Box::new(rdr.into_records().enumerate().map(move |(i, rec)| {
            let rec = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
            self.parse_record(&rec)
                .with_context(|| format!("CSV record #{} in {}", i + 1, self.path.display()))
        })))
    }
}

/// Type a cell by content: null marker, integer, float, bool, else string.
/// Empty cells carry no type evidence.
fn infer_cell(cell: &str, nulls: &[String]) -> Value {
    if cell.is_empty() || nulls.iter().any(|n| n == cell) {
        return Value::Null;
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Value::Int64(v);
    }
    // "inf" and "nan" parse as floats but are far more often text.
    if cell.bytes().any(|b| b.is_ascii_digit())
        && let Ok(v) = cell.parse::<f64>()
    {
        return Value::Float64(v);
    }
    Value::parse_as(cell, DataType::Bool).unwrap_or_else(|| Value::Utf8(cell.to_string()))
}

/// Read one CSV file, or every file matching a glob, into a table.
///
/// Without a declared schema, types are inferred per file and unified across
/// files before a second, typed pass.
///
/// # Errors
/// Returns an error when a file cannot be read, files disagree on column
/// names, or a cell does not parse as its column's type.
pub fn read_csv_table(path_or_glob: &str, options: &CsvReadOptions) -> Result<Table> {
    let paths = resolve_paths(path_or_glob)?;
    let schema = match &options.schema {
        Some(schema) => schema.clone(),
        None => {
            let mut unified: Option<Schema> = None;
            for path in &paths {
                let inferred = infer_schema(&CsvSource::new(path, options.clone()))
                    .with_context(|| format!("infer schema of {}", path.display()))?;
                unified = Some(match unified {
                    None => inferred,
                    Some(prev) => unify_schemas(&prev, &inferred)
                        .with_context(|| format!("combine {}", path.display()))?,
                });
            }
            unified.unwrap_or_default()
        }
    };

    let typed = options.clone().with_schema(schema.clone());
    let tables = paths
        .iter()
        .map(|path| {
            collect_table(&CsvSource::new(path, typed.clone()), &schema)
                .with_context(|| format!("read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::concat(&tables)?)
}

/// Write `table` as CSV; returns the number of data rows written.
///
/// Floats always carry a decimal point or exponent, so a re-read infers them
/// as floats again.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_csv_table(path: impl AsRef<Path>, table: &Table, options: &CsvWriteOptions) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let sink = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    let mut wtr = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(sink);

    if options.has_headers {
        wtr.write_record(table.column_names())
            .with_context(|| format!("write CSV header to {}", path.display()))?;
    }
    for (i, row) in table.rows().enumerate() {
        let cells = row
            .iter()
            .map(|v| cell_text(v).unwrap_or_else(|| options.null_value.clone()));
        wtr.write_record(cells)
            .with_context(|| format!("write CSV record #{} to {}", i + 1, path.display()))?;
    }
    let mut sink = wtr
        .into_inner()
        .map_err(|e| anyhow!("flush CSV writer for {}: {}", path.display(), e.error()))?;
    sink.flush()?;
    Ok(table.num_rows())
}

pub(crate) fn cell_text(v: &Value) -> Option<String> {
    match v {
        Value::Float64(f) => Some(format!("{f:?}")),
        other => other.to_canonical_string(),
    }
}
