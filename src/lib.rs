//! # Ironframe
//!
//! Columnar **tables**, a self-describing **column file format**, and
//! hive-style **partitioned datasets** for Rust.
//!
//! ## Key Features
//!
//! - **Typed columns** - Int64, Float64, Utf8 and Bool storage with a validity bitmap
//! - **Immutable tables** - projection, slicing and concatenation return new tables
//! - **Column projection on read** - unselected columns are skipped, not decoded
//! - **Partitioned datasets** - `col=value` directory trees written and read back
//! - **Partition pruning** - filter fragments by partition values before any data is read
//! - **Lazy handles** - [`format::LazyTable`] and [`Dataset`] load headers only
//! - **Parallel I/O** - per-partition writes and per-file reads on rayon (feature `parallel-io`)
//! - **Interop** - CSV, JSON Lines, Parquet and Arrow IPC adapters (all optional via feature flags)
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironframe::{ColumnBuffer, Dataset, Table, write_dataset};
//! use ironframe::options::WriteOptions;
//!
//! # fn main() -> ironframe::Result<()> {
//! let table = Table::try_new(vec![
//!     ColumnBuffer::utf8("group", vec![Some("A"), Some("B"), Some("C")]),
//!     ColumnBuffer::int64("score", vec![Some(99), Some(97), Some(99)]),
//! ])?;
//!
//! // One directory per distinct score: scores/score=97/, scores/score=99/
//! write_dataset(&table, "scores", &["score"], &WriteOptions::default())?;
//!
//! let back = Dataset::open("scores")?.to_table()?;
//! assert_eq!(back.num_rows(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Table
//!
//! A [`Table`] is an ordered set of uniquely named [`ColumnBuffer`]s of equal
//! length. Column storage is a closed sum type ([`ColumnData`]); a column's
//! type is fixed when it is built.
//!
//! ### Column files
//!
//! [`format::write_file`] stores one table as a header (schema and row count)
//! followed by one length-prefixed block per column. [`format::read_file`]
//! reads it back, optionally keeping only some columns. See [`format`] for the
//! byte layout.
//!
//! ### Datasets
//!
//! [`write_dataset`] groups rows by their partition column values and writes
//! each group under `root/col1=v1/col2=v2/`. [`Dataset::open`] discovers such
//! a tree, and [`Dataset::read`] re-attaches the partition columns from the
//! paths.
//!
//! ## Errors
//!
//! Core operations return [`Result`] with the typed [`Error`] taxonomy. The
//! [`io`] adapters return `anyhow::Result`.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Enables |
//! |---|---|---|
//! | `io-jsonl` | yes | [`io::jsonl`] |
//! | `io-csv` | yes | [`io::csv`] |
//! | `io-parquet` | yes | `io::parquet` and `io::arrow` |
//! | `io-ipc` | yes | `io::ipc` and `io::arrow` |
//! | `parallel-io` | yes | rayon-backed dataset writes and reads |
//! | `compression-gzip` | yes | gzip blocks and `.gz` text files |
//! | `compression-zstd` | yes | zstd blocks and `.zst` text files |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bitmap;
pub mod column;
pub mod dataset;
pub mod error;
pub mod format;
pub mod io;
pub mod logging;
pub mod options;
pub mod schema;
pub mod table;
pub mod testing;
pub mod types;

pub use bitmap::Bitmap;
pub use column::{ColumnBuffer, ColumnData};
pub use dataset::{Dataset, Fragment, PartitionFilter, PartitionKey, WriteSummary, write_dataset};
pub use error::{Error, Result};
pub use format::{LazyTable, open_file, read_file, write_file};
pub use io::compression::Compression;
pub use options::{DatasetOptions, ExistingDataBehavior, FileWriteOptions, WriteOptions};
pub use schema::{Field, Schema};
pub use table::{Table, TableBuilder};
pub use types::{DataType, Value};

#[cfg(feature = "io-csv")]
pub use io::csv::{CsvReadOptions, CsvWriteOptions, read_csv_table, write_csv_table};

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{read_jsonl_table, write_jsonl_table};

#[cfg(feature = "io-parquet")]
pub use io::parquet::{read_parquet_table, write_parquet_table};

#[cfg(feature = "io-ipc")]
pub use io::ipc::{read_ipc_table, write_ipc_table};
