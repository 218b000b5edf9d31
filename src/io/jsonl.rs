//! Newline-delimited JSON (JSONL) ingestion and export for [`Table`]s.
//!
//! Each non-blank line is one JSON object. Column order follows the first
//! appearance of each key across the file, and a key missing from a line is
//! null. Numbers without a fraction or exponent are integers, other numbers
//! are floats. Nested arrays and objects are kept as their JSON text.

use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use crate::io::glob::resolve_paths;
use crate::io::rows::{RowIter, RowSource, collect_table, infer_schema, unify_schemas};
use crate::schema::Schema;
use crate::table::Table;
use crate::types::Value;
use anyhow::{Context, Result, bail};
use serde_json::{Map, Number, Value as Json};
use std::collections::HashSet;
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One JSONL file viewed as a [`RowSource`].
#[derive(Clone, Debug)]
pub struct JsonlSource {
    path: PathBuf,
    /// Fixes the column set and order instead of scanning for keys.
    schema: Option<Schema>,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn objects(&self) -> Result<impl Iterator<Item = Result<Map<String, Json>>> + '_> {
        let path = &self.path;
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let reader = BufReader::new(
            auto_detect_reader(f, path)
                .with_context(|| format!("setup decompression for {}", path.display()))?,
        );
        Ok(reader
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(move |(idx, line)| {
                let line =
                    line.with_context(|| format!("read line {} in {}", idx + 1, path.display()))?;
                match serde_json::from_str::<Json>(&line)
                    .with_context(|| format!("parse JSONL line {} in {}", idx + 1, path.display()))?
                {
                    Json::Object(map) => Ok(map),
                    other => bail!(
                        "line {} in {} is not a JSON object: {other}",
                        idx + 1,
                        path.display()
                    ),
                }
            }))
    }
}

impl RowSource for JsonlSource {
    fn column_names(&self) -> Result<Vec<String>> {
        if let Some(schema) = &self.schema {
            return Ok(schema.names().map(str::to_string).collect());
        }
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        for obj in self.objects()? {
            for key in obj?.keys() {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }
        Ok(names)
    }

    fn rows(&self) -> Result<RowIter<'_>> {
        let names = self.column_names()?;
        let objects = self.objects()?;
        Ok(Box::new(objects.map(move |obj| {
            let obj = obj?;
            Ok(names
                .iter()
                .map(|name| obj.get(name).map_or(Value::Null, json_to_value))
                .collect())
        })))
    }
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int64)
            .or_else(|| n.as_f64().map(Value::Float64))
            .unwrap_or(Value::Null),
        Json::String(s) => Value::Utf8(s.clone()),
        nested => Value::Utf8(nested.to_string()),
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Int64(v) => Json::Number((*v).into()),
        Value::Float64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Utf8(s) => Json::String(s.clone()),
        Value::Bool(b) => Json::Bool(*b),
    }
}

/// Read one JSONL file, or every file matching a glob, into a table.
///
/// With `schema`, only the declared columns are kept and values are cast to
/// their declared types. Without it, types are inferred and unified across
/// files.
///
/// # Errors
/// Returns an error for unreadable files, lines that are not JSON objects,
/// files with different keys, or values that cannot be cast.
pub fn read_jsonl_table(path_or_glob: &str, schema: Option<&Schema>) -> Result<Table> {
    let paths = resolve_paths(path_or_glob)?;
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => {
            let mut unified: Option<Schema> = None;
            for path in &paths {
                let inferred = infer_schema(&JsonlSource::new(path))
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
    let tables = paths
        .iter()
        .map(|path| {
            let source = JsonlSource::new(path).with_schema(schema.clone());
            collect_table(&source, &schema).with_context(|| format!("read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::concat(&tables)?)
}

/// Write `table` as JSONL, one object per row with keys in column order.
/// Non-finite floats are written as `null`. Returns the number of rows.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_jsonl_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;

    let names = table.column_names();
    for (i, row) in table.rows().enumerate() {
        let obj: Map<String, Json> = names
            .iter()
            .zip(&row)
            .map(|(name, v)| ((*name).to_string(), value_to_json(v)))
            .collect();
        serde_json::to_writer(&mut w, &obj)
            .with_context(|| format!("serialize row #{i} to {}", path.display()))?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(table.num_rows())
}
