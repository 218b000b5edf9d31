//! The `.ifr` column file format.
//!
//! A file is a header followed by one block per column:
//!
//! ```text
//! "IRFR" | version u16 | codec u8 | reserved u8 | field_count u32
//! field_count × { name_len u32 | name | type u8 }
//! row_count u64
//! field_count × { block_len u64 | block }
//! ```
//!
//! A block (after decompression) is the validity bitmap (`ceil(rows / 8)`
//! bytes, LSB-first, `1` = valid) followed by the values. Int64 and Float64
//! values are 8 little-endian bytes each, booleans are bit-packed, and
//! strings are `len u32 | bytes`. All integers are little-endian.
//!
//! Because every block is length-prefixed, [`read_table`] can skip a column
//! it was not asked for with a single seek. This is the column projection
//! that separates a columnar format from a row format.
//!
//! # Example
//!
//! ```no_run
//! use ironframe::format::{open_file, read_file, write_file};
//! use ironframe::options::FileWriteOptions;
//! use ironframe::testing::sample_scores;
//! # fn main() -> ironframe::Result<()> {
//! let table = sample_scores();
//! write_file("scores.ifr", &table, &FileWriteOptions::default())?;
//!
//! let scores = read_file("scores.ifr", Some(&["score"]))?;
//! assert_eq!(scores.column_names(), vec!["score"]);
//!
//! // Header only; column data stays on disk until `collect`.
//! let lazy = open_file("scores.ifr")?;
//! assert_eq!(lazy.num_rows(), 3);
//! assert_eq!(lazy.collect()?, table);
//! # Ok(()) }
//! ```

mod block;
mod header;

pub use header::FileHeader;

use crate::error::{Error, IoResultExt, Result};
use crate::io::compression::Compression;
use crate::options::FileWriteOptions;
use crate::schema::Schema;
use crate::table::Table;
use std::collections::HashSet;
use std::fs::{File, create_dir_all};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Leading bytes of every column file.
pub const MAGIC: &[u8; 4] = b"IRFR";
/// Current (and only) on-disk version.
pub const FORMAT_VERSION: u16 = 1;
/// Upper bound on a field name, in bytes.
pub const MAX_NAME_LEN: usize = 64 * 1024;

/// Map a read failure while decoding: running out of bytes means corruption.
pub(crate) fn truncated(e: io::Error, what: &str) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::corrupt(format!("truncated while reading {what}"))
    } else {
        Error::io(PathBuf::new(), e)
    }
}

/// Serialize `table` to `sink`; returns the number of bytes written.
///
/// The sink is flushed before returning.
///
/// # Errors
/// [`Error::Io`] when the sink fails (with an empty path for in-memory
/// sinks), [`Error::InvalidTable`] when a value exceeds a format limit.
pub fn write_table<W: Write>(table: &Table, mut sink: W, options: &FileWriteOptions) -> Result<u64> {
    let header = FileHeader {
        schema: table.schema(),
        row_count: table.num_rows() as u64,
        compression: options.compression,
    };
    let mut written = header.write_to(&mut sink)?;
    for column in table.columns() {
        let raw = block::encode(column)?;
        let stored = options
            .compression
            .compress(&raw)
            .map_err(|e| Error::io(PathBuf::new(), e))?;
        sink.write_all(&(stored.len() as u64).to_le_bytes())
            .and_then(|()| sink.write_all(&stored))
            .map_err(|e| Error::io(PathBuf::new(), e))?;
        written += 8 + stored.len() as u64;
    }
    sink.flush().map_err(|e| Error::io(PathBuf::new(), e))?;
    debug!(
        target: "ironframe::format",
        rows = table.num_rows(),
        columns = table.num_columns(),
        bytes = written,
        codec = options.compression.name(),
        "wrote table"
    );
    Ok(written)
}

/// Deserialize a table from `source`.
///
/// With `column_select`, only the named columns are decoded, in the
/// requested order. The other blocks are skipped by seeking past them.
///
/// # Errors
/// - [`Error::UnknownColumn`] for a selected name missing from the file. This
///   is checked before any column data is read.
/// - [`Error::InvalidTable`] for a name selected twice.
/// - [`Error::CorruptFile`] for a malformed header, a truncated or over-long
///   payload, or an undecodable compressed block.
/// - [`Error::Io`] for other read failures.
pub fn read_table<R: Read + Seek>(mut source: R, column_select: Option<&[&str]>) -> Result<Table> {
    let header = FileHeader::read_from(&mut source)?;
    let rows = header.rows()?;
    let fields = &header.schema.fields;

    // slots[i] = output position of file column i, if selected.
    let mut slots: Vec<Option<usize>> = vec![None; fields.len()];
    let output_len = match column_select {
        None => {
            for (i, slot) in slots.iter_mut().enumerate() {
                *slot = Some(i);
            }
            fields.len()
        }
        Some(names) => {
            let mut seen = HashSet::with_capacity(names.len());
            for (pos, name) in names.iter().enumerate() {
                if !seen.insert(*name) {
                    return Err(Error::InvalidTable(format!("column {name} selected twice")));
                }
                let idx = header
                    .schema
                    .index_of(name)
                    .ok_or_else(|| Error::unknown_column(*name))?;
                slots[idx] = Some(pos);
            }
            names.len()
        }
    };
    let last_wanted = slots.iter().rposition(Option::is_some);

    let mut columns = vec![None; output_len];
    for (i, field) in fields.iter().enumerate() {
        if last_wanted.is_none_or(|last| i > last) {
            break;
        }
        let block_len = u64::from_le_bytes(header::read_array(&mut source, "block length")?);
        match slots[i] {
            Some(pos) => {
                let stored = read_block(&mut source, block_len, &field.name)?;
                let raw = decompress(header.compression, &stored, &field.name)?;
                columns[pos] = Some(block::decode(field, rows, &raw)?);
            }
            None => {
                let skip = i64::try_from(block_len).map_err(|_| {
                    Error::corrupt(format!("column {}: block length overflows", field.name))
                })?;
                source
                    .seek(SeekFrom::Current(skip))
                    .map_err(|e| Error::io(PathBuf::new(), e))?;
            }
        }
    }
    let columns = columns.into_iter().flatten().collect();
    Table::try_new_with_rows(columns, rows)
}

fn read_block<R: Read>(source: &mut R, block_len: u64, column: &str) -> Result<Vec<u8>> {
    let mut stored = Vec::new();
    source
        .by_ref()
        .take(block_len)
        .read_to_end(&mut stored)
        .map_err(|e| Error::io(PathBuf::new(), e))?;
    if stored.len() as u64 != block_len {
        return Err(Error::corrupt(format!(
            "column {column}: block truncated ({} of {block_len} bytes)",
            stored.len()
        )));
    }
    Ok(stored)
}

fn decompress(codec: Compression, stored: &[u8], column: &str) -> Result<Vec<u8>> {
    codec.decompress(stored).map_err(|e| match e.kind() {
        io::ErrorKind::Unsupported => Error::io(PathBuf::new(), e),
        _ => Error::corrupt(format!("column {column}: {} block: {e}", codec.name())),
    })
}

/// Write `table` to `path`, creating parent directories.
///
/// # Errors
/// See [`write_table`]; I/O errors carry `path`.
pub fn write_file(path: impl AsRef<Path>, table: &Table, options: &FileWriteOptions) -> Result<u64> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).at(parent)?;
    }
    let file = File::create(path).at(path)?;
    let mut writer = BufWriter::new(file);
    let written = write_table(table, &mut writer, options).map_err(|e| e.at_path(path))?;
    writer
        .into_inner()
        .map_err(|e| Error::io(path, e.into_error()))?;
    Ok(written)
}

/// Read the table stored at `path`, optionally projecting columns.
///
/// # Errors
/// See [`read_table`]; errors carry `path`.
pub fn read_file(path: impl AsRef<Path>, column_select: Option<&[&str]>) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).at(path)?;
    read_table(BufReader::new(file), column_select).map_err(|e| e.at_path(path))
}

/// Read only the header of the file at `path`.
///
/// # Errors
/// [`Error::Io`] if the file cannot be opened, [`Error::CorruptFile`] for a
/// malformed header.
pub fn read_header(path: impl AsRef<Path>) -> Result<FileHeader> {
    let path = path.as_ref();
    let file = File::open(path).at(path)?;
    FileHeader::read_from(&mut BufReader::new(file)).map_err(|e| e.at_path(path))
}

/// Open a column file without reading its data.
///
/// # Errors
/// See [`read_header`].
pub fn open_file(path: impl AsRef<Path>) -> Result<LazyTable> {
    let path = path.as_ref();
    let header = read_header(path)?;
    Ok(LazyTable {
        path: path.to_path_buf(),
        header,
    })
}

/// A column file whose header has been read but whose data has not.
///
/// This is the deferred counterpart of a materialized [`Table`]. Call
/// [`LazyTable::read`] or [`LazyTable::collect`] to load data.
#[derive(Clone, Debug)]
pub struct LazyTable {
    path: PathBuf,
    header: FileHeader,
}

impl LazyTable {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.header.schema
    }

    #[must_use]
    pub const fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Row count recorded in the header.
    ///
    /// Saturates on targets where it exceeds `usize`; reading such a file
    /// fails with [`Error::CorruptFile`].
    #[must_use]
    pub fn num_rows(&self) -> usize {
        usize::try_from(self.header.row_count).unwrap_or(usize::MAX)
    }

    /// Materialize the selected columns.
    ///
    /// # Errors
    /// See [`read_file`].
    pub fn read(&self, column_select: Option<&[&str]>) -> Result<Table> {
        read_file(&self.path, column_select)
    }

    /// Materialize every column.
    ///
    /// # Errors
    /// See [`read_file`].
    pub fn collect(&self) -> Result<Table> {
        self.read(None)
    }
}
