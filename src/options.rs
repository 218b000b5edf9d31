//! Configuration for file and dataset writes and dataset discovery.
//!
//! All option structs implement `Default`, expose fluent `with_*` setters and
//! deserialize from JSON with missing fields defaulted, so a saved
//! configuration file only needs the settings it changes:
//!
//! ```no_run
//! use ironframe::options::WriteOptions;
//! # fn main() -> ironframe::Result<()> {
//! // {"max_rows_per_file": 10000, "file": {"compression": "zstd"}}
//! let opts = WriteOptions::from_json_file("write.json")?;
//! # Ok(()) }
//! ```

use crate::error::{Error, IoResultExt, Result};
use crate::io::compression::Compression;
use crate::schema::Schema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Extension of data files written by [`crate::dataset::write_dataset`].
pub const DEFAULT_EXTENSION: &str = "ifr";

/// Default leaf file name; `{i}` is a per-partition file counter.
pub const DEFAULT_BASENAME_TEMPLATE: &str = "part-{i}.ifr";

/// Options for writing a single column file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileWriteOptions {
    /// Codec applied to each column block.
    pub compression: Compression,
}

impl FileWriteOptions {
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// What a dataset write does when the target directory already holds data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingDataBehavior {
    /// Keep unrelated files; overwrite files whose generated names collide.
    #[default]
    OverwriteOrIgnore,
    /// Refuse to write into a non-empty directory.
    Error,
    /// Remove each partition directory before writing into it.
    DeleteMatching,
}

/// Options for [`crate::dataset::write_dataset`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub file: FileWriteOptions,
    /// Split a partition into several files of at most this many rows.
    pub max_rows_per_file: Option<usize>,
    /// Leaf file name. `{i}` expands to the file's index within its partition
    /// and `{uuid}` to a random v4 UUID.
    pub basename_template: String,
    pub existing_data_behavior: ExistingDataBehavior,
    /// Write partitions on the rayon pool (feature `parallel-io`).
    pub parallel: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            file: FileWriteOptions::default(),
            max_rows_per_file: None,
            basename_template: DEFAULT_BASENAME_TEMPLATE.to_string(),
            existing_data_behavior: ExistingDataBehavior::default(),
            parallel: false,
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.file.compression = compression;
        self
    }

    #[must_use]
    pub const fn with_max_rows_per_file(mut self, rows: usize) -> Self {
        self.max_rows_per_file = Some(rows);
        self
    }

    #[must_use]
    pub fn with_basename_template(mut self, template: impl Into<String>) -> Self {
        self.basename_template = template.into();
        self
    }

    #[must_use]
    pub const fn with_existing_data_behavior(mut self, behavior: ExistingDataBehavior) -> Self {
        self.existing_data_behavior = behavior;
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load options from a JSON file.
    ///
    /// # Errors
    /// [`Error::Io`] when the file cannot be opened or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref())
    }
}

/// Options for [`crate::dataset::Dataset::open_with`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatasetOptions {
    /// Declared types of partition columns; absent columns are inferred.
    pub partition_schema: Option<Schema>,
    /// Extension (without the dot) that marks data files.
    pub extension: String,
    /// Read files on the rayon pool (feature `parallel-io`).
    pub parallel: bool,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            partition_schema: None,
            extension: DEFAULT_EXTENSION.to_string(),
            parallel: false,
        }
    }
}

impl DatasetOptions {
    #[must_use]
    pub fn with_partition_schema(mut self, schema: Schema) -> Self {
        self.partition_schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load options from a JSON file.
    ///
    /// # Errors
    /// [`Error::Io`] when the file cannot be opened or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref())
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).at(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::io(path, e.into()))
}
