use super::filter::PartitionFilter;
use super::partition::{PartitionKey, parse_segment, parse_typed};
use super::run_all;
use crate::column::ColumnBuffer;
use crate::error::{Error, IoResultExt, Result};
use crate::format::{read_file, read_header};
use crate::options::DatasetOptions;
use crate::schema::{Field, Schema};
use crate::table::Table;
use crate::types::DataType;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One leaf directory: its typed partition key and the data files inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub partition: PartitionKey,
    pub files: Vec<PathBuf>,
}

/// A discovered dataset. Opening reads only directory listings; column data
/// is loaded by [`Dataset::read`].
#[derive(Clone, Debug)]
pub struct Dataset {
    root: PathBuf,
    options: DatasetOptions,
    partition_fields: Schema,
    fragments: Vec<Fragment>,
}

/// A leaf found during the walk, before its segment values are typed.
struct RawLeaf {
    dir: PathBuf,
    values: Vec<Option<String>>,
    files: Vec<PathBuf>,
}

/// A directory seen during the walk.
struct DirState {
    leaf: RawLeaf,
    has_subdirs: bool,
}

/// Partition columns by depth (with the first directory naming each) and the
/// leaves holding data files, in sorted pre-order.
struct Walk {
    columns: Vec<(String, PathBuf)>,
    leaves: Vec<RawLeaf>,
}

fn walk(root: &Path, extension: &str) -> Result<Walk> {
    let mut columns: Vec<(String, PathBuf)> = Vec::new();
    let mut dirs: Vec<DirState> = Vec::new();
    // Index into `dirs` of the directory currently open at each depth.
    let mut open: Vec<usize> = Vec::new();

    let entries = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
    for entry in entries {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;
        let path = entry.path();
        let depth = entry.depth();

        if entry.file_type().is_dir() {
            open.truncate(depth);
            let mut values = Vec::new();
            if let Some(&parent) = open.last() {
                let segment = depth - 1;
                let name = entry.file_name().to_string_lossy();
                let (column, value) =
                    parse_segment(&name).map_err(|reason| Error::layout(path, reason))?;
                match columns.get(segment) {
                    Some((expected, first)) if *expected != column => {
                        return Err(Error::layout(
                            path,
                            format!(
                                "partition column {column:?} at depth {segment} conflicts with {expected:?} at {}",
                                first.display()
                            ),
                        ));
                    }
                    Some(_) => {}
                    None => columns.push((column, path.to_path_buf())),
                }
                dirs[parent].has_subdirs = true;
                values = dirs[parent].leaf.values.clone();
                values.push(value);
            }
            open.push(dirs.len());
            dirs.push(DirState {
                leaf: RawLeaf {
                    dir: path.to_path_buf(),
                    values,
                    files: Vec::new(),
                },
                has_subdirs: false,
            });
        } else if path.extension().is_some_and(|ext| ext == extension)
            && let Some(&parent) = open.get(depth.saturating_sub(1))
        {
            dirs[parent].leaf.files.push(path.to_path_buf());
        } else {
            debug!(target: "ironframe::dataset", path = %path.display(), "skipping non-data file");
        }
    }

    let mut leaves = Vec::new();
    for DirState { leaf, has_subdirs } in dirs {
        if leaf.files.is_empty() {
            continue;
        }
        if has_subdirs {
            return Err(Error::layout(
                &leaf.dir,
                "directory holds both data files and partition directories",
            ));
        }
        leaves.push(leaf);
    }
    Ok(Walk { columns, leaves })
}

/// Dot files and `_`-prefixed bookkeeping files; `_col=value` is still a
/// partition directory.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || (name.starts_with('_') && !name.contains('='))
}

/// Narrowest type that every non-null segment value parses as.
fn infer_partition_type<'a>(values: impl Iterator<Item = &'a str> + Clone) -> DataType {
    let mut values = values.peekable();
    if values.peek().is_none() {
        return DataType::Utf8;
    }
    let is_canonical_int = |s: &str| s.parse::<i64>().is_ok_and(|v| v.to_string() == s);
    if values.clone().all(is_canonical_int) {
        DataType::Int64
    } else if values.clone().all(|s| s.parse::<f64>().is_ok()) {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

impl Dataset {
    /// Discover the dataset under `root` with default options.
    ///
    /// # Errors
    /// See [`Dataset::open_with`].
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(root, DatasetOptions::default())
    }

    /// Discover the dataset under `root`.
    ///
    /// # Errors
    /// - [`Error::Io`] when `root` or a directory below it cannot be listed.
    /// - [`Error::InvalidLayout`] when `root` is not a directory, a directory
    ///   is not named `col=value`, partition names disagree at one depth, data
    ///   files sit above the leaf depth, or a segment value does not parse as
    ///   its declared type.
    pub fn open_with(root: impl AsRef<Path>, options: DatasetOptions) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if fs::metadata(&root).at(&root)?.is_file() {
            return Err(Error::layout(&root, "dataset root is a file"));
        }

        let Walk { columns, leaves } = walk(&root, &options.extension)?;

        let depth = columns.len();
        if let Some(leaf) = leaves.iter().find(|l| l.values.len() != depth) {
            return Err(Error::layout(
                &leaf.dir,
                format!(
                    "data files at depth {} but the dataset is partitioned {depth} levels deep",
                    leaf.values.len()
                ),
            ));
        }

        let fields = columns
            .iter()
            .enumerate()
            .map(|(d, (name, _))| {
                let declared = options
                    .partition_schema
                    .as_ref()
                    .and_then(|s| s.field(name))
                    .map(|f| f.data_type);
                let data_type = declared.unwrap_or_else(|| {
                    infer_partition_type(leaves.iter().filter_map(|l| l.values[d].as_deref()))
                });
                Field::new(name.clone(), data_type)
            })
            .collect::<Vec<_>>();
        let partition_fields = Schema::try_new(fields).map_err(|e| Error::layout(&root, e.to_string()))?;

        let fragments = leaves
            .into_iter()
            .map(|leaf| {
                let assignments = partition_fields
                    .fields
                    .iter()
                    .zip(&leaf.values)
                    .map(|(field, raw)| {
                        parse_typed(raw.as_deref(), field.data_type)
                            .map(|v| (field.name.clone(), v))
                            .ok_or_else(|| {
                                Error::layout(
                                    &leaf.dir,
                                    format!(
                                        "value {:?} of {} is not a valid {}",
                                        raw.as_deref().unwrap_or_default(),
                                        field.name,
                                        field.data_type
                                    ),
                                )
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Fragment {
                    partition: PartitionKey::new(assignments),
                    files: leaf.files,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            target: "ironframe::dataset",
            path = %root.display(),
            partitions = %partition_fields,
            fragments = fragments.len(),
            "opened dataset"
        );
        Ok(Self {
            root,
            options,
            partition_fields,
            fragments,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Partition columns in path order, with their resolved types.
    #[must_use]
    pub const fn partition_schema(&self) -> &Schema {
        &self.partition_fields
    }

    /// Leaf directories in discovery order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Every data file, in read order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.fragments
            .iter()
            .flat_map(|f| f.files.iter().map(PathBuf::as_path))
    }

    /// File columns (from the first file header) followed by the partition
    /// columns.
    ///
    /// # Errors
    /// [`Error::Io`] / [`Error::CorruptFile`] when the first header cannot be
    /// read.
    pub fn schema(&self) -> Result<Schema> {
        let mut fields = match self.files().next() {
            Some(path) => read_header(path)?.schema.fields,
            None => Vec::new(),
        };
        fields.extend(self.partition_fields.fields.iter().cloned());
        Schema::try_new(fields).map_err(|e| Error::SchemaMismatch(e.to_string()))
    }

    /// Total rows in the fragments matching `filter`, from file headers only.
    ///
    /// # Errors
    /// Filter binding errors (see [`PartitionFilter::bind`]) and header read
    /// errors.
    pub fn count_rows(&self, filter: Option<&PartitionFilter>) -> Result<u64> {
        let mut total = 0;
        for fragment in self.select_fragments(filter)? {
            for file in &fragment.files {
                total += read_header(file)?.row_count;
            }
        }
        Ok(total)
    }

    /// Materialize every row and column.
    ///
    /// # Errors
    /// See [`Dataset::read`].
    pub fn to_table(&self) -> Result<Table> {
        self.read(None, None)
    }

    /// Read the fragments matching `filter`, restricted to `column_select`.
    ///
    /// Partition columns come back as constant columns rebuilt from the
    /// directory names. Without a selection, file columns come first (in file
    /// order) and partition columns after them (in path order).
    ///
    /// # Errors
    /// - [`Error::UnknownColumn`] for a selected or filtered name that is not
    ///   in the dataset.
    /// - [`Error::SchemaMismatch`] when data files disagree on their schema.
    /// - File errors from [`read_file`], aggregated into [`Error::Multiple`]
    ///   when several parallel reads fail.
    pub fn read(&self, column_select: Option<&[&str]>, filter: Option<&PartitionFilter>) -> Result<Table> {
        let fragments = self.select_fragments(filter)?;
        let schema = self.schema()?;
        if let Some(names) = column_select
            && let Some(missing) = names.iter().find(|n| schema.field(n).is_none())
        {
            return Err(Error::unknown_column(*missing));
        }

        let file_select: Option<Vec<&str>> = column_select.map(|names| {
            names
                .iter()
                .copied()
                .filter(|n| self.partition_fields.field(n).is_none())
                .collect()
        });
        let wanted_partitions: Vec<&Field> = self
            .partition_fields
            .fields
            .iter()
            .filter(|f| column_select.is_none_or(|names| names.contains(&f.name.as_str())))
            .collect();

        let jobs: Vec<(&Fragment, &PathBuf)> = fragments
            .iter()
            .flat_map(|&fragment| fragment.files.iter().map(move |file| (fragment, file)))
            .collect();
        let tables = run_all(&jobs, self.options.parallel, |(fragment, file)| {
            let mut table = read_file(file, file_select.as_deref())?;
            for field in &wanted_partitions {
                let value = fragment
                    .partition
                    .get(&field.name)
                    .ok_or_else(|| Error::unknown_column(field.name.as_str()))?;
                let column =
                    ColumnBuffer::constant(field.name.clone(), field.data_type, value, table.num_rows())?;
                table = table.with_column(column)?;
            }
            match column_select {
                Some(names) => table.project(names),
                None => Ok(table),
            }
        })?;

        let result = if tables.is_empty() {
            let empty = match column_select {
                Some(names) => schema.project(names)?,
                None => schema,
            };
            Table::empty(&empty)
        } else {
            Table::concat(&tables)?
        };
        debug!(
            target: "ironframe::dataset",
            path = %self.root.display(),
            files = jobs.len(),
            rows = result.num_rows(),
            "read dataset"
        );
        Ok(result)
    }

    fn select_fragments(&self, filter: Option<&PartitionFilter>) -> Result<Vec<&Fragment>> {
        let Some(filter) = filter else {
            return Ok(self.fragments.iter().collect());
        };
        let bound = filter.bind(&self.partition_fields)?;
        Ok(self
            .fragments
            .iter()
            .filter(|f| bound.matches(&f.partition))
            .collect())
    }
}
