//! The in-memory [`Table`]: named, equal-length, typed columns.
//!
//! Tables are immutable once built. Every transformation ([`Table::project`],
//! [`Table::slice`], [`Table::concat`], [`Table::drop_columns`]) returns a new
//! table. Use [`TableBuilder`] to assemble one row at a time.
//!
//! ```
//! use ironframe::{ColumnBuffer, Table};
//!
//! let t = Table::try_new(vec![
//!     ColumnBuffer::utf8("group", vec![Some("A"), Some("B"), Some("C")]),
//!     ColumnBuffer::int64("score", vec![Some(99), Some(97), Some(99)]),
//! ])?;
//! let scores = t.project(&["score"])?;
//! assert_eq!(scores.num_columns(), 1);
//! assert_eq!(scores.num_rows(), 3);
//! # Ok::<(), ironframe::Error>(())
//! ```

use crate::column::{ColumnBuffer, ColumnData};
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};
use crate::types::Value;
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<ColumnBuffer>,
    row_count: usize,
}

impl Table {
    /// Build a table from columns, inferring the row count from the first one.
    ///
    /// # Errors
    /// [`Error::InvalidTable`] on duplicate names or ragged columns.
    pub fn try_new(columns: Vec<ColumnBuffer>) -> Result<Self> {
        let row_count = columns.first().map_or(0, ColumnBuffer::len);
        Self::try_new_with_rows(columns, row_count)
    }

    /// Build a table with an explicit row count; needed for zero-column tables.
    ///
    /// # Errors
    /// [`Error::InvalidTable`] on duplicate names or a column whose length is
    /// not `row_count`.
    pub fn try_new_with_rows(columns: Vec<ColumnBuffer>, row_count: usize) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for c in &columns {
            if !seen.insert(c.name()) {
                return Err(Error::InvalidTable(format!(
                    "duplicate column name: {}",
                    c.name()
                )));
            }
            if c.len() != row_count {
                return Err(Error::InvalidTable(format!(
                    "column {} has {} rows, expected {row_count}",
                    c.name(),
                    c.len()
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    /// A zero-row table with the given schema.
    #[must_use]
    pub fn empty(schema: &Schema) -> Self {
        let columns = schema
            .fields
            .iter()
            .map(|f| ColumnBuffer::non_null(f.name.clone(), ColumnData::empty(f.data_type)))
            .collect();
        Self {
            columns,
            row_count: 0,
        }
    }

    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn schema(&self) -> Schema {
        self.columns.iter().map(ColumnBuffer::field).collect()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnBuffer::name).collect()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnBuffer] {
        &self.columns
    }

    #[must_use]
    pub fn into_columns(self) -> Vec<ColumnBuffer> {
        self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnBuffer> {
        self.columns.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn column_at(&self, idx: usize) -> Option<&ColumnBuffer> {
        self.columns.get(idx)
    }

    /// The values of row `idx` in column order.
    ///
    /// # Panics
    /// Panics if `idx >= num_rows()`.
    #[must_use]
    pub fn row(&self, idx: usize) -> Vec<Value> {
        assert!(idx < self.row_count, "row {idx} out of range for {} rows", self.row_count);
        self.columns.iter().map(|c| c.value(idx)).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.row_count).map(|i| self.row(i))
    }

    /// Keep only `names`, in the requested order.
    ///
    /// # Errors
    /// [`Error::UnknownColumn`] if a name is absent; [`Error::InvalidTable`] if
    /// a name is requested twice.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|n| {
                self.column(n.as_ref())
                    .cloned()
                    .ok_or_else(|| Error::unknown_column(n.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::try_new_with_rows(columns, self.row_count)
    }

    /// Remove the named columns; names that are not present are ignored.
    #[must_use]
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let columns = self
            .columns
            .iter()
            .filter(|c| !names.iter().any(|n| n.as_ref() == c.name()))
            .cloned()
            .collect();
        Self {
            columns,
            row_count: self.row_count,
        }
    }

    /// Append a column at the end.
    ///
    /// # Errors
    /// [`Error::InvalidTable`] on a duplicate name or wrong length.
    pub fn with_column(&self, column: ColumnBuffer) -> Result<Self> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self::try_new_with_rows(columns, self.row_count)
    }

    /// Gather the given rows, in the given order, keeping column order.
    ///
    /// # Panics
    /// Panics if any index is out of range.
    #[must_use]
    pub fn slice(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            row_count: rows.len(),
        }
    }

    /// Contiguous rows `offset..offset + len`, clamped to the table.
    #[must_use]
    pub fn slice_range(&self, offset: usize, len: usize) -> Self {
        let start = offset.min(self.row_count);
        let end = start.saturating_add(len).min(self.row_count);
        let rows: Vec<usize> = (start..end).collect();
        self.slice(&rows)
    }

    /// Stack tables vertically, in input order.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] if the inputs do not share one schema (names,
    /// types and order), or if `tables` is empty.
    pub fn concat(tables: &[Self]) -> Result<Self> {
        let Some((first, rest)) = tables.split_first() else {
            return Err(Error::SchemaMismatch(
                "cannot concatenate zero tables".to_string(),
            ));
        };
        let schema = first.schema();
        for (i, t) in rest.iter().enumerate() {
            let other = t.schema();
            if other != schema {
                return Err(Error::SchemaMismatch(format!(
                    "table #{} has schema {other}, expected {schema}",
                    i + 1
                )));
            }
        }
        let mut columns = first.columns.clone();
        for t in rest {
            for (dst, src) in columns.iter_mut().zip(&t.columns) {
                dst.extend_from(src)?;
            }
        }
        let row_count = tables.iter().map(|t| t.row_count).sum();
        Ok(Self { columns, row_count })
    }

    /// Rows reordered by every column, left to right, nulls first.
    ///
    /// Two tables with the same multiset of rows sort to equal tables, which
    /// is how partitioned reads are compared against their source.
    #[must_use]
    pub fn sort_by_all_columns(&self) -> Self {
        let keys: Vec<Vec<Value>> = self.rows().collect();
        let mut order: Vec<usize> = (0..self.row_count).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        self.slice(&order)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW_ROWS: usize = 10;
        writeln!(
            f,
            "# Table: {} x {}",
            self.row_count,
            self.columns.len()
        )?;
        let header: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} <{}>", c.name(), c.data_type()))
            .collect();
        writeln!(f, "{}", header.join("\t"))?;
        for i in 0..self.row_count.min(PREVIEW_ROWS) {
            let cells: Vec<String> = self.columns.iter().map(|c| c.value(i).to_string()).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        if self.row_count > PREVIEW_ROWS {
            writeln!(f, "# ... with {} more rows", self.row_count - PREVIEW_ROWS)?;
        }
        Ok(())
    }
}

/// Row-at-a-time construction of a [`Table`] with a fixed schema.
pub struct TableBuilder {
    schema: Schema,
    columns: Vec<Vec<Value>>,
    row_count: usize,
}

impl TableBuilder {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        let columns = vec![Vec::new(); schema.len()];
        Self {
            schema,
            columns,
            row_count: 0,
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.row_count
    }

    /// Append one row; values must follow schema order.
    ///
    /// # Errors
    /// [`Error::InvalidTable`] on an arity mismatch, [`Error::TypeMismatch`] on
    /// a non-null value of the wrong type. A failed row leaves the builder
    /// unchanged.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::InvalidTable(format!(
                "row has {} values, schema has {} fields",
                row.len(),
                self.schema.len()
            )));
        }
        for (field, v) in self.schema.fields.iter().zip(&row) {
            check_type(field, v)?;
        }
        for (col, v) in self.columns.iter_mut().zip(row) {
            col.push(v);
        }
        self.row_count += 1;
        Ok(())
    }

    /// # Errors
    /// Propagates column construction failures.
    pub fn finish(self) -> Result<Table> {
        let columns = self
            .schema
            .fields
            .iter()
            .zip(&self.columns)
            .map(|(f, values)| ColumnBuffer::from_values(f.name.clone(), f.data_type, values))
            .collect::<Result<Vec<_>>>()?;
        Table::try_new_with_rows(columns, self.row_count)
    }
}

fn check_type(field: &Field, value: &Value) -> Result<()> {
    match value.data_type() {
        Some(t) if t != field.data_type => Err(Error::TypeMismatch {
            column: field.name.clone(),
            expected: field.data_type,
            found: value.type_name(),
        }),
        _ => Ok(()),
    }
}
