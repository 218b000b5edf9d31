use ironframe::dataset::{Dataset, PartitionFilter, write_dataset};
use ironframe::options::{DatasetOptions, ExistingDataBehavior, FileWriteOptions, WriteOptions};
use ironframe::testing::{
    airquality, assert_tables_equal, assert_tables_equal_unordered, mixed_types, sample_scores,
};
use ironframe::{
    ColumnBuffer, Compression, DataType, Error, Field, Schema, Table, Value, logging, write_file,
};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn defaults() -> WriteOptions {
    WriteOptions::default()
}

fn subdirs(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[test]
fn two_level_partitioning_round_trips() -> anyhow::Result<()> {
    logging::init_for_tests();
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    let summary = write_dataset(&aq, dir.path(), &["Month", "Day"], &defaults())?;
    assert_eq!(summary.partitions, 153);
    assert_eq!(summary.rows_written, 153);
    assert_eq!(summary.files.len(), 153);

    assert_eq!(
        subdirs(dir.path())?,
        vec!["Month=5", "Month=6", "Month=7", "Month=8", "Month=9"]
    );
    assert_eq!(subdirs(&dir.path().join("Month=6"))?.len(), 30);
    assert!(dir.path().join("Month=5/Day=31/part-0.ifr").is_file());

    let ds = Dataset::open(dir.path())?;
    assert_eq!(ds.fragments().len(), 153);
    assert_eq!(
        ds.partition_schema(),
        &Schema::try_new(vec![
            Field::new("Month", DataType::Int64),
            Field::new("Day", DataType::Int64),
        ])?
    );
    assert_eq!(
        ds.schema()?.names().collect::<Vec<_>>(),
        vec!["Ozone", "Solar.R", "Wind", "Temp", "Month", "Day"]
    );
    assert_tables_equal_unordered(&ds.to_table()?, &aq);
    Ok(())
}

fn relative_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(root)?.to_path_buf());
        }
    }
    Ok(files)
}

#[test]
fn fresh_roots_get_identical_layouts() -> anyhow::Result<()> {
    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;
    let aq = airquality();
    write_dataset(&aq, first.path(), &["Month", "Day"], &defaults())?;
    write_dataset(&aq, second.path(), &["Month", "Day"], &defaults())?;

    let files = relative_files(first.path())?;
    assert_eq!(files.len(), 153);
    assert_eq!(files, relative_files(second.path())?);
    Ok(())
}

#[test]
fn stored_files_omit_partition_columns() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let summary = write_dataset(&airquality(), dir.path(), &["Month"], &defaults())?;
    let first = ironframe::read_file(&summary.files[0], None)?;
    assert_eq!(first.column_names(), vec!["Ozone", "Solar.R", "Wind", "Temp", "Day"]);
    assert_eq!(first.num_rows(), 31);
    Ok(())
}

#[test]
fn filters_prune_fragments() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    write_dataset(&aq, dir.path(), &["Month"], &defaults())?;
    let ds = Dataset::open(dir.path())?;

    let may = ds.read(None, Some(&PartitionFilter::eq("Month", 5)))?;
    assert_eq!(may.num_rows(), 31);
    assert!(may.column("Month").unwrap().values().all(|v| v == Value::Int64(5)));

    // String literals are cast to the partition type.
    assert_eq!(ds.count_rows(Some(&PartitionFilter::eq("Month", "5")))?, 31);
    assert_eq!(ds.count_rows(None)?, 153);
    assert_eq!(ds.count_rows(Some(&PartitionFilter::is_in("Month", [5, 6])))?, 61);
    assert_eq!(ds.count_rows(Some(&PartitionFilter::eq("Month", 5).not()))?, 122);
    assert_eq!(
        ds.count_rows(Some(
            &PartitionFilter::eq("Month", 5).or(PartitionFilter::eq("Month", 9))
        ))?,
        61
    );
    assert_eq!(
        ds.count_rows(Some(
            &PartitionFilter::eq("Month", 5).and(PartitionFilter::eq("Month", 9))
        ))?,
        0
    );
    let late = PartitionFilter::custom(|key| {
        key.get("Month").is_some_and(|m| *m >= Value::Int64(8))
    });
    assert_eq!(ds.count_rows(Some(&late))?, 61);

    let none = ds.read(None, Some(&PartitionFilter::eq("Month", 12)))?;
    assert_eq!(none.num_rows(), 0);
    assert_eq!(none.schema(), ds.schema()?);
    Ok(())
}

#[test]
fn filter_errors_are_typed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_dataset(&airquality(), dir.path(), &["Month"], &defaults())?;
    let ds = Dataset::open(dir.path())?;

    let err = ds.read(None, Some(&PartitionFilter::eq("Temp", 70))).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { ref name } if name == "Temp"));

    let err = ds.count_rows(Some(&PartitionFilter::eq("Month", "May"))).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { expected: DataType::Int64, .. }));
    Ok(())
}

#[test]
fn column_selection_mixes_file_and_partition_columns() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    write_dataset(&aq, dir.path(), &["Month", "Day"], &defaults())?;
    let ds = Dataset::open(dir.path())?;

    let picked = ds.read(Some(&["Day", "Ozone"]), None)?;
    assert_eq!(picked.column_names(), vec!["Day", "Ozone"]);
    assert_tables_equal_unordered(&picked, &aq.project(&["Day", "Ozone"])?);

    let months = ds.read(Some(&["Month"]), Some(&PartitionFilter::eq("Month", 7)))?;
    assert_eq!(months.column_names(), vec!["Month"]);
    assert_eq!(months.num_rows(), 31);

    let err = ds.read(Some(&["Ozone", "Humidity"]), None).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { ref name } if name == "Humidity"));
    Ok(())
}

#[test]
fn nulls_and_awkward_strings_survive_paths() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = mixed_types();
    write_dataset(&t, dir.path(), &["label"], &defaults())?;
    assert!(dir.path().join("label=a%2Fb%3Dc").is_dir());
    assert!(dir.path().join("label=__HIVE_DEFAULT_PARTITION__").is_dir());
    assert!(dir.path().join("label=").is_dir());

    let ds = Dataset::open(dir.path())?;
    assert_eq!(ds.partition_schema().fields[0].data_type, DataType::Utf8);
    assert_tables_equal_unordered(&ds.to_table()?, &t);

    let nulls = ds.read(Some(&["id"]), Some(&PartitionFilter::is_null("label")))?;
    assert_eq!(nulls.column("id").unwrap().value(0), Value::Int64(3));
    assert_eq!(nulls.num_rows(), 1);
    assert_eq!(ds.count_rows(Some(&PartitionFilter::eq("label", "a/b=c")))?, 1);
    Ok(())
}

#[test]
fn float_partitions_infer_float64() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = mixed_types();
    write_dataset(&t, dir.path(), &["ratio"], &defaults())?;
    let ds = Dataset::open(dir.path())?;
    assert_eq!(ds.partition_schema().fields[0].data_type, DataType::Float64);
    assert_tables_equal_unordered(&ds.to_table()?, &t);
    Ok(())
}

#[test]
fn whole_number_floats_stay_float64() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = Table::try_new(vec![
        ColumnBuffer::float64("w", vec![Some(5.0), Some(6.0), None]),
        ColumnBuffer::int64("v", vec![Some(1), Some(2), Some(3)]),
    ])?;
    write_dataset(&t, dir.path(), &["w"], &defaults())?;
    assert!(dir.path().join("w=5.0").is_dir());

    let ds = Dataset::open(dir.path())?;
    assert_eq!(ds.partition_schema().fields[0].data_type, DataType::Float64);
    assert_tables_equal_unordered(&ds.to_table()?, &t);
    Ok(())
}

#[test]
fn dotted_partition_columns_are_not_hidden() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = Table::try_new(vec![
        ColumnBuffer::int64(".id", vec![Some(1), Some(2)]),
        ColumnBuffer::int64("_rank", vec![Some(1), Some(1)]),
        ColumnBuffer::utf8("v", vec![Some("x"), Some("y")]),
    ])?;
    let summary = write_dataset(&t, dir.path(), &[".id", "_rank"], &defaults())?;
    assert_eq!(summary.rows_written, 2);
    assert!(dir.path().join("%2Eid=1/%5Frank=1").is_dir());

    let back = Dataset::open(dir.path())?.to_table()?;
    assert_eq!(back.num_rows(), 2);
    assert_tables_equal_unordered(&back, &t);
    Ok(())
}

#[test]
fn empty_partition_column_names_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = Table::try_new(vec![ColumnBuffer::int64("", vec![Some(1)])])?;
    assert!(matches!(
        write_dataset(&t, dir.path(), &[""], &defaults()),
        Err(Error::InvalidTable(_))
    ));
    assert!(relative_files(dir.path())?.is_empty());
    Ok(())
}

#[test]
fn declared_partition_types_override_inference() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = mixed_types();
    write_dataset(&t, dir.path(), &["flag"], &defaults())?;

    let inferred = Dataset::open(dir.path())?;
    assert_eq!(inferred.partition_schema().fields[0].data_type, DataType::Utf8);

    let opts = DatasetOptions::default()
        .with_partition_schema(Schema::try_new(vec![Field::new("flag", DataType::Bool)])?);
    let typed = Dataset::open_with(dir.path(), opts)?;
    assert_tables_equal_unordered(&typed.to_table()?, &t);
    assert_eq!(typed.count_rows(Some(&PartitionFilter::eq("flag", true)))?, 2);
    Ok(())
}

#[test]
fn max_rows_per_file_splits_partitions() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    let opts = defaults().with_max_rows_per_file(10);
    let summary = write_dataset(&aq, dir.path(), &["Month"], &opts)?;
    assert_eq!(summary.files.len(), 18);
    assert!(dir.path().join("Month=5/part-3.ifr").is_file());
    assert!(!dir.path().join("Month=6/part-3.ifr").exists());

    let ds = Dataset::open(dir.path())?;
    assert_eq!(ds.files().count(), 18);
    assert_tables_equal_unordered(&ds.to_table()?, &aq);
    Ok(())
}

#[test]
fn compressed_datasets_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    let opts = defaults().with_compression(Compression::Zstd);
    write_dataset(&aq, dir.path(), &["Month"], &opts)?;
    assert_tables_equal_unordered(&Dataset::open(dir.path())?.to_table()?, &aq);
    Ok(())
}

#[test]
fn existing_data_behaviors() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    write_dataset(&aq, dir.path(), &["Month"], &defaults())?;

    let refuse = defaults().with_existing_data_behavior(ExistingDataBehavior::Error);
    let err = write_dataset(&aq, dir.path(), &["Month"], &refuse).unwrap_err();
    assert!(
        matches!(err, Error::Io { ref source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists),
        "{err}"
    );

    // Only the Month=5 directory is replaced.
    let may_subset = aq.slice(&[0, 1]);
    let replace = defaults().with_existing_data_behavior(ExistingDataBehavior::DeleteMatching);
    write_dataset(&may_subset, dir.path(), &["Month"], &replace)?;
    let ds = Dataset::open(dir.path())?;
    assert_eq!(ds.count_rows(None)?, 153 - 31 + 2);
    assert_eq!(ds.count_rows(Some(&PartitionFilter::eq("Month", 5)))?, 2);
    Ok(())
}

#[test]
fn overwrite_or_ignore_respects_file_names() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = sample_scores();

    write_dataset(&t, dir.path(), &["group"], &defaults())?;
    write_dataset(&t, dir.path(), &["group"], &defaults())?;
    assert_eq!(Dataset::open(dir.path())?.count_rows(None)?, 3);

    let unique = defaults().with_basename_template("chunk-{uuid}.ifr");
    write_dataset(&t, dir.path(), &["group"], &unique)?;
    write_dataset(&t, dir.path(), &["group"], &unique)?;
    assert_eq!(Dataset::open(dir.path())?.count_rows(None)?, 9);
    Ok(())
}

#[test]
fn invalid_write_options_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let t = sample_scores();
    let bad_template = defaults().with_basename_template("data.ifr");
    assert!(matches!(
        write_dataset(&t, dir.path(), &["group"], &bad_template),
        Err(Error::InvalidTable(_))
    ));
    let zero = defaults().with_max_rows_per_file(0);
    assert!(matches!(
        write_dataset(&t, dir.path(), &["group"], &zero),
        Err(Error::InvalidTable(_))
    ));
    assert!(matches!(
        write_dataset(&t, dir.path(), &["points"], &defaults()),
        Err(Error::UnknownColumn { .. })
    ));
}

#[test]
fn unpartitioned_and_empty_tables() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let t = sample_scores();
    let flat = dir.path().join("flat");
    write_dataset::<&str>(&t, &flat, &[], &defaults())?;
    assert!(flat.join("part-0.ifr").is_file());
    let ds = Dataset::open(&flat)?;
    assert!(ds.partition_schema().is_empty());
    assert_tables_equal(&ds.to_table()?, &t);

    let empty = dir.path().join("empty");
    write_dataset::<&str>(&Table::empty(&t.schema()), &empty, &[], &defaults())?;
    let back = Dataset::open(&empty)?.to_table()?;
    assert_eq!(back.num_rows(), 0);
    assert_eq!(back.schema(), t.schema());

    let nothing = dir.path().join("nothing");
    let summary = write_dataset(&Table::empty(&t.schema()), &nothing, &["group"], &defaults())?;
    assert_eq!(summary.partitions, 0);
    assert!(Dataset::open(&nothing)?.to_table()?.num_rows() == 0);
    Ok(())
}

#[test]
fn parallel_write_and_read_match_sequential() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    write_dataset(&aq, dir.path(), &["Month", "Day"], &defaults().with_parallel(true))?;
    let seq = Dataset::open(dir.path())?.to_table()?;
    let par = Dataset::open_with(dir.path(), DatasetOptions::default().with_parallel(true))?.to_table()?;
    assert_tables_equal(&par, &seq);
    assert_tables_equal_unordered(&par, &aq);
    Ok(())
}

#[cfg(feature = "parallel-io")]
#[test]
fn parallel_failures_are_aggregated() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // Plain files where partition directories should go.
    fs::write(dir.path().join("group=A"), b"")?;
    fs::write(dir.path().join("group=B"), b"")?;
    let err = write_dataset(&sample_scores(), dir.path(), &["group"], &defaults().with_parallel(true))
        .unwrap_err();
    match err {
        Error::Multiple(errors) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().all(|e| matches!(e, Error::Io { .. })));
        }
        other => panic!("expected aggregated errors, got {other}"),
    }
    assert!(dir.path().join("group=C/part-0.ifr").is_file());
    Ok(())
}

#[test]
fn hidden_and_foreign_files_are_ignored() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let aq = airquality();
    write_dataset(&aq, dir.path(), &["Month"], &defaults())?;
    fs::write(dir.path().join("_SUCCESS"), b"")?;
    fs::write(dir.path().join(".crc"), b"")?;
    fs::create_dir(dir.path().join("_temporary"))?;
    fs::write(dir.path().join("Month=5/notes.txt"), b"hello")?;
    assert_tables_equal_unordered(&Dataset::open(dir.path())?.to_table()?, &aq);
    Ok(())
}

fn put_file(path: &Path) -> anyhow::Result<()> {
    write_file(path, &sample_scores(), &FileWriteOptions::default())?;
    Ok(())
}

fn assert_layout_error(root: &Path) {
    match Dataset::open(root) {
        Err(Error::InvalidLayout { .. }) => {}
        Err(other) => panic!("expected an invalid layout error, got {other}"),
        Ok(ds) => panic!("expected an invalid layout error, opened {:?}", ds.fragments()),
    }
}

#[test]
fn inconsistent_layouts_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let renamed = dir.path().join("renamed");
    put_file(&renamed.join("a=1/part-0.ifr"))?;
    put_file(&renamed.join("b=2/part-0.ifr"))?;
    assert_layout_error(&renamed);

    let mixed = dir.path().join("mixed");
    put_file(&mixed.join("a=1/part-0.ifr"))?;
    put_file(&mixed.join("a=1/b=2/part-0.ifr"))?;
    assert_layout_error(&mixed);

    let unnamed = dir.path().join("unnamed");
    put_file(&unnamed.join("2024/part-0.ifr"))?;
    assert_layout_error(&unnamed);

    let ragged = dir.path().join("ragged");
    put_file(&ragged.join("a=1/part-0.ifr"))?;
    put_file(&ragged.join("a=2/b=1/part-0.ifr"))?;
    assert_layout_error(&ragged);

    let mistyped = dir.path().join("mistyped");
    put_file(&mistyped.join("Month=May/part-0.ifr"))?;
    let opts = DatasetOptions::default()
        .with_partition_schema(Schema::try_new(vec![Field::new("Month", DataType::Int64)])?);
    assert!(matches!(
        Dataset::open_with(&mistyped, opts),
        Err(Error::InvalidLayout { .. })
    ));

    let file_root = dir.path().join("single.ifr");
    put_file(&file_root)?;
    assert_layout_error(&file_root);

    assert!(matches!(
        Dataset::open(dir.path().join("missing")),
        Err(Error::Io { .. })
    ));
    Ok(())
}

#[test]
fn options_load_from_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let write_cfg = dir.path().join("write.json");
    fs::write(
        &write_cfg,
        r#"{"max_rows_per_file": 10, "file": {"compression": "gzip"}, "existing_data_behavior": "delete_matching"}"#,
    )?;
    let opts = WriteOptions::from_json_file(&write_cfg)?;
    assert_eq!(opts.max_rows_per_file, Some(10));
    assert_eq!(opts.file.compression, Compression::Gzip);
    assert_eq!(opts.existing_data_behavior, ExistingDataBehavior::DeleteMatching);
    assert_eq!(opts.basename_template, "part-{i}.ifr");

    let read_cfg = dir.path().join("read.json");
    fs::write(
        &read_cfg,
        r#"{"partition_schema": {"fields": [{"name": "Month", "data_type": "Utf8"}]}}"#,
    )?;
    let data = dir.path().join("aq");
    write_dataset(&airquality(), &data, &["Month"], &opts)?;
    let ds = Dataset::open_with(&data, DatasetOptions::from_json_file(&read_cfg)?)?;
    assert_eq!(ds.partition_schema().fields[0].data_type, DataType::Utf8);
    assert_eq!(ds.count_rows(Some(&PartitionFilter::eq("Month", 5)))?, 31);

    fs::write(&read_cfg, "{not json")?;
    assert!(matches!(
        DatasetOptions::from_json_file(&read_cfg),
        Err(Error::Io { .. })
    ));
    Ok(())
}
