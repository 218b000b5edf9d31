use super::partition::{PartitionGroup, PartitionKey, plan};
use super::run_all;
use crate::error::{Error, IoResultExt, Result};
use crate::format::write_file;
use crate::options::{ExistingDataBehavior, WriteOptions};
use crate::table::Table;
use std::fs::{self, create_dir_all};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// What a [`write_dataset`] call produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Number of partition directories written.
    pub partitions: usize,
    pub rows_written: usize,
    /// Every data file, in write order.
    pub files: Vec<PathBuf>,
}

/// Write `table` under `root`, one directory level per partition column.
///
/// Partition columns are dropped from the stored files; their values live in
/// the `col=value` path segments. A table with no partition columns is written
/// directly into `root`, even when it has no rows, so its schema survives.
///
/// Output is not rolled back on failure.
///
/// # Errors
/// - [`Error::UnknownColumn`] / [`Error::InvalidTable`] from planning.
/// - [`Error::InvalidTable`] for a `basename_template` without `{i}` or
///   `{uuid}`, or a `max_rows_per_file` of zero.
/// - [`Error::Io`] for directory or file failures, including an
///   `AlreadyExists` error when [`ExistingDataBehavior::Error`] finds data.
/// - [`Error::Multiple`] when several partitions fail in a parallel write.
pub fn write_dataset<S: AsRef<str>>(
    table: &Table,
    root: impl AsRef<Path>,
    partition_columns: &[S],
    options: &WriteOptions,
) -> Result<WriteSummary> {
    let root = root.as_ref();
    let template = &options.basename_template;
    if !template.contains("{i}") && !template.contains("{uuid}") {
        return Err(Error::InvalidTable(format!(
            "basename_template {template:?} needs {{i}} or {{uuid}}"
        )));
    }
    if options.max_rows_per_file == Some(0) {
        return Err(Error::InvalidTable("max_rows_per_file must be positive".to_string()));
    }

    let mut groups = plan(table, partition_columns)?;
    if groups.is_empty() && partition_columns.is_empty() {
        groups.push(PartitionGroup {
            key: PartitionKey::default(),
            rows: Vec::new(),
        });
    }

    if options.existing_data_behavior == ExistingDataBehavior::Error && has_entries(root)? {
        return Err(Error::io(
            root,
            io::Error::new(io::ErrorKind::AlreadyExists, "dataset directory is not empty"),
        ));
    }
    create_dir_all(root).at(root)?;

    let partition_names: Vec<&str> = partition_columns.iter().map(AsRef::as_ref).collect();
    let files = run_all(&groups, options.parallel, |group| {
        write_group(table, root, &partition_names, group, options)
    })?;

    let summary = WriteSummary {
        partitions: groups.len(),
        rows_written: table.num_rows(),
        files: files.into_iter().flatten().collect(),
    };
    info!(
        target: "ironframe::dataset",
        path = %root.display(),
        partitions = summary.partitions,
        files = summary.files.len(),
        rows = summary.rows_written,
        "wrote dataset"
    );
    Ok(summary)
}

fn write_group(
    table: &Table,
    root: &Path,
    partition_names: &[&str],
    group: &PartitionGroup,
    options: &WriteOptions,
) -> Result<Vec<PathBuf>> {
    let dir = root.join(group.key.relative_path());
    if options.existing_data_behavior == ExistingDataBehavior::DeleteMatching {
        clear_partition(&dir, dir == root)?;
    }
    create_dir_all(&dir).at(&dir)?;

    let data = table.slice(&group.rows).drop_columns(partition_names);
    let chunk = options
        .max_rows_per_file
        .unwrap_or(usize::MAX)
        .min(data.num_rows().max(1));

    let mut files = Vec::new();
    let mut offset = 0;
    loop {
        let len = chunk.min(data.num_rows() - offset);
        let path = dir.join(file_name(&options.basename_template, files.len()));
        write_file(&path, &data.slice_range(offset, len), &options.file)?;
        debug!(
            target: "ironframe::dataset",
            partition = %group.key,
            path = %path.display(),
            rows = len,
            "wrote fragment file"
        );
        files.push(path);
        offset += len;
        if offset >= data.num_rows() {
            break;
        }
    }
    Ok(files)
}

fn file_name(template: &str, index: usize) -> String {
    let mut name = template.replace("{i}", &index.to_string());
    if name.contains("{uuid}") {
        name = name.replace("{uuid}", &Uuid::new_v4().simple().to_string());
    }
    name
}

fn has_entries(dir: &Path) -> Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(dir, e)),
    }
}

/// Remove a partition's previous contents. The dataset root itself is never
/// removed, only the regular files directly inside it.
fn clear_partition(dir: &Path, is_root: bool) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if !is_root {
        return fs::remove_dir_all(dir).at(dir);
    }
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if path.is_file() {
            fs::remove_file(&path).at(&path)?;
        }
    }
    Ok(())
}
