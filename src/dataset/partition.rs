//! Partition keys, `col=value` path segments, and the partition planner.

use crate::error::{Error, Result};
use crate::table::Table;
use crate::types::{DataType, Value};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// Directory value used for a null partition key.
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Bytes escaped as `%XX` in path segments. Non-ASCII bytes are always escaped.
const SEGMENT: &AsciiSet = &CONTROLS.add(b'%').add(b'/').add(b'\\').add(b'=').add(b':');

/// The partition column assignments of one output directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub assignments: Vec<(String, Value)>,
}

impl PartitionKey {
    #[must_use]
    pub const fn new(assignments: Vec<(String, Value)>) -> Self {
        Self { assignments }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.assignments
            .iter()
            .find_map(|(name, v)| (name == column).then_some(v))
    }

    /// One `col=value` segment per assignment, in order.
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|(name, v)| format!("{}={}", escape_column(name), encode_value(v)))
            .collect()
    }

    /// The directory of this partition relative to the dataset root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.segments().into_iter().collect()
    }

    /// Canonical string tuple used to order groups deterministically.
    fn sort_key(&self) -> Vec<String> {
        self.assignments.iter().map(|(_, v)| canonical_text(v)).collect()
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.assignments.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.segments().join("/"))
    }
}

/// Rows of a table that share one partition key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionGroup {
    pub key: PartitionKey,
    /// Ascending row indices into the planned table.
    pub rows: Vec<usize>,
}

/// Group the rows of `table` by the values of `partition_columns`.
///
/// The requested column order defines the key order, regardless of where the
/// columns sit in the table. Nulls form their own group. Groups are ordered by
/// a stable sort on their canonical string encoding, so identical input
/// always produces identical output.
///
/// With no partition columns, the whole table is one group with an empty key
/// (or there are no groups when the table has no rows).
///
/// # Errors
/// [`Error::UnknownColumn`] for a name missing from the table,
/// [`Error::InvalidTable`] for an empty name or a name listed twice.
pub fn plan<S: AsRef<str>>(table: &Table, partition_columns: &[S]) -> Result<Vec<PartitionGroup>> {
    let mut seen = HashSet::with_capacity(partition_columns.len());
    let columns = partition_columns
        .iter()
        .map(|name| {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(Error::InvalidTable(
                    "partition column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name) {
                return Err(Error::InvalidTable(format!(
                    "partition column {name} listed twice"
                )));
            }
            table.column(name).ok_or_else(|| Error::unknown_column(name))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<PartitionGroup> = Vec::new();
    for row in 0..table.num_rows() {
        let tuple: Vec<Value> = columns.iter().map(|c| c.value(row)).collect();
        let slot = *index.entry(tuple.clone()).or_insert_with(|| {
            let key = PartitionKey::new(
                columns
                    .iter()
                    .map(|c| c.name().to_string())
                    .zip(tuple)
                    .collect(),
            );
            groups.push(PartitionGroup { key, rows: Vec::new() });
            groups.len() - 1
        });
        groups[slot].rows.push(row);
    }

    // sort_by_cached_key is stable: ties keep first-appearance order.
    groups.sort_by_cached_key(|g| g.key.sort_key());
    Ok(groups)
}

/// Unescaped canonical text of a partition value. Floats keep a decimal
/// point so whole numbers are not read back as integers.
fn canonical_text(value: &Value) -> String {
    match value {
        Value::Null => NULL_PARTITION.to_string(),
        Value::Float64(v) => format!("{v:?}"),
        other => other.to_canonical_string().unwrap_or_default(),
    }
}

/// Canonical, path-safe encoding of a partition value.
#[must_use]
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => NULL_PARTITION.to_string(),
        Value::Utf8(s) if s == NULL_PARTITION => format!("%5F{}", &s[1..]),
        other => escape_segment(&canonical_text(other)),
    }
}

/// Decode a segment value; `None` stands for the null sentinel.
///
/// # Errors
/// Returns a description of the malformed escape.
pub fn decode_value(raw: &str) -> std::result::Result<Option<String>, String> {
    if raw == NULL_PARTITION {
        return Ok(None);
    }
    unescape_segment(raw).map(Some)
}

/// Parse a `col=value` directory name into its unescaped name and value.
///
/// # Errors
/// Returns a description when the name has no `=`, an empty column name, or
/// a malformed escape.
pub fn parse_segment(segment: &str) -> std::result::Result<(String, Option<String>), String> {
    let (name, value) = segment
        .split_once('=')
        .ok_or_else(|| format!("directory {segment:?} is not of the form col=value"))?;
    if name.is_empty() {
        return Err(format!("directory {segment:?} has an empty column name"));
    }
    Ok((unescape_segment(name)?, decode_value(value)?))
}

/// Interpret decoded segment text as a typed value.
#[must_use]
pub fn parse_typed(raw: Option<&str>, data_type: DataType) -> Option<Value> {
    match raw {
        None => Some(Value::Null),
        Some(text) => Value::parse_as(text, data_type),
    }
}

fn escape_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

/// Column names additionally escape a leading `.` or `_`, which would
/// otherwise mark the directory as hidden.
fn escape_column(name: &str) -> String {
    match name.as_bytes().first() {
        Some(&lead @ (b'.' | b'_')) => format!("%{lead:02X}{}", escape_segment(&name[1..])),
        _ => escape_segment(name),
    }
}

fn unescape_segment(raw: &str) -> std::result::Result<String, String> {
    for (i, _) in raw.match_indices('%') {
        let hex = raw
            .get(i + 1..i + 3)
            .ok_or_else(|| format!("truncated escape in {raw:?}"))?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("bad escape %{hex} in {raw:?}"));
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| format!("escaped bytes in {raw:?} are not UTF-8"))
}
